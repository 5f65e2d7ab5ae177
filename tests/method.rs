mod common;

use std::sync::Arc;

use common::{make_loader, CountingLoader, TestClass};
use parse::flags::MethodAccessFlag;
use runtime::{
    error::{ClassFormatError, LinkageError, Throwable},
    object::loader::ClassLoader,
};
use support::descriptor::FieldType;

#[test]
fn methods_point_back_at_their_class() -> anyhow::Result<()> {
    let loader = make_loader();
    let class = loader.define_class(
        TestClass::new("com/example/Point")
            .code_method(MethodAccessFlag::PUBLIC, "<init>", "(II)V", 4, &[])
            .code_method(MethodAccessFlag::STATIC, "<clinit>", "()V", 1, &[])
            .code_method(
                MethodAccessFlag::PUBLIC | MethodAccessFlag::STATIC,
                "main",
                "([Ljava/lang/String;)V",
                1,
                &[],
            )
            .build(),
    )?;

    assert_eq!(class.methods().len(), 3);

    let constructor = class.get_method("<init>", "(II)V").expect("constructor");
    assert!(constructor.is_constructor());
    assert_eq!(constructor.actual_arg_count(), 3);
    assert!(Arc::ptr_eq(&constructor.class().expect("class"), &class));

    assert!(class.clinit().is_some());
    assert!(class.main_method().is_some());
    assert!(class.get_method("<init>", "()V").is_none());

    Ok(())
}

#[test]
fn parameter_types_follow_declaration_order() -> anyhow::Result<()> {
    let loader = make_loader();
    let class = loader.define_class(
        TestClass::new("com/example/Sink")
            .method(
                MethodAccessFlag::PUBLIC | MethodAccessFlag::ABSTRACT,
                "accept",
                "(I[JLjava/lang/String;[[Ljava/lang/String;)V",
            )
            .build(),
    )?;

    let method = class.get_method("accept", "(I[JLjava/lang/String;[[Ljava/lang/String;)V")
        .expect("method");
    let types = method.parameter_types()?;

    let names: Vec<_> = types.iter().map(|class| class.name().to_string()).collect();
    assert_eq!(
        names,
        vec!["int", "[J", "java/lang/String", "[[Ljava/lang/String;"]
    );

    assert!(types[0].is_primitive());
    assert!(types[1].is_array());
    assert_eq!(
        types[1].component_type().map(|c| c.name().to_string()),
        Some("long".to_string())
    );
    assert!(Arc::ptr_eq(
        &types[2],
        &loader.find_class("java/lang/String").expect("string")
    ));

    Ok(())
}

#[test]
fn parameter_types_are_resolved_once() -> anyhow::Result<()> {
    let loader = CountingLoader::new(make_loader());
    let class = loader.define(
        TestClass::new("com/example/Twice")
            .method(
                MethodAccessFlag::STATIC | MethodAccessFlag::NATIVE,
                "join",
                "(Ljava/lang/String;D)Ljava/lang/String;",
            )
            .build(),
    )?;
    let method = class.methods()[0].clone();
    let before = loader.calls();

    let first = method.parameter_types()?;
    let after_first = loader.calls();
    let second = method.parameter_types()?;

    assert_eq!(after_first - before, 2);
    assert_eq!(loader.calls(), after_first);
    assert!(Arc::ptr_eq(&first, &second));

    Ok(())
}

#[test]
fn no_parameters_means_no_loads() -> anyhow::Result<()> {
    let loader = CountingLoader::new(make_loader());
    let class = loader.define(
        TestClass::new("com/example/Quiet")
            .code_method(MethodAccessFlag::STATIC, "run", "()Ljava/lang/String;", 2, &[])
            .build(),
    )?;
    let method = class.methods()[0].clone();
    let before = loader.calls();

    assert!(method.parameter_types()?.is_empty());
    assert_eq!(loader.calls(), before);

    Ok(())
}

#[test]
fn failed_resolution_is_retried() -> anyhow::Result<()> {
    let loader = CountingLoader::new(make_loader());
    let class = loader.define(
        TestClass::new("com/example/Early")
            .method(
                MethodAccessFlag::PUBLIC | MethodAccessFlag::ABSTRACT,
                "consume",
                "(Lcom/example/Late;)V",
            )
            .build(),
    )?;
    let method = class.methods()[0].clone();

    assert!(matches!(
        method.parameter_types(),
        Err(LinkageError::ClassNotFound(name)) if name == "com/example/Late"
    ));
    assert!(loader.requested("com/example/Late"));

    loader
        .inner()
        .define_class(TestClass::new("com/example/Late").build())?;

    let types = method.parameter_types()?;
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].name(), "com/example/Late");

    Ok(())
}

#[test]
fn dropped_classes_cannot_resolve() -> anyhow::Result<()> {
    let loader = CountingLoader::new(make_loader());
    let class = loader.define(
        TestClass::new("com/example/Transient")
            .method(MethodAccessFlag::ABSTRACT, "take", "(I)V")
            .build(),
    )?;
    let method = class.methods()[0].clone();
    drop(class);

    assert!(method.class().is_none());
    assert!(matches!(
        method.parameter_types(),
        Err(LinkageError::ClassUnloaded(_))
    ));

    Ok(())
}

#[test]
fn dropped_loaders_cannot_resolve() -> anyhow::Result<()> {
    let loader = CountingLoader::new(make_loader());
    let class = loader.define(
        TestClass::new("com/example/Orphan")
            .method(MethodAccessFlag::ABSTRACT, "take", "(I)V")
            .build(),
    )?;
    drop(loader);

    let method = class.methods()[0].clone();
    assert!(matches!(
        method.parameter_types(),
        Err(LinkageError::LoaderUnavailable(name)) if name == "com/example/Orphan"
    ));

    Ok(())
}

#[test]
fn malformed_methods_fail_the_class() {
    let loader = make_loader();
    let defined = loader.define_class(
        TestClass::new("com/example/Broken")
            .method(MethodAccessFlag::ABSTRACT, "bad", "(V)V")
            .build(),
    );

    match defined {
        Err(Throwable::ClassFormat(ClassFormatError::Descriptor {
            class_name,
            method_name,
            ..
        })) => {
            assert_eq!(class_name, "com/example/Broken");
            assert_eq!(method_name, "bad");
        }
        other => panic!("expected a descriptor error, got {:?}", other),
    }

    assert!(loader.find_class("com/example/Broken").is_none());
}

#[test]
fn classes_are_defined_once() -> anyhow::Result<()> {
    let loader = make_loader();
    loader.define_class(TestClass::new("com/example/Single").build())?;

    let again = loader.define_class(TestClass::new("com/example/Single").build());
    assert!(matches!(again, Err(Throwable::Linkage(LinkageError::Other { .. }))));

    Ok(())
}

#[test]
fn missing_superclasses_are_reported() {
    let loader = make_loader();
    let defined = loader.define_class(
        TestClass::new("com/example/Child")
            .extends("com/example/Parent")
            .build(),
    );

    assert!(matches!(
        defined,
        Err(Throwable::Linkage(LinkageError::ClassNotFound(name))) if name == "com/example/Parent"
    ));
}

#[test]
fn arrays_are_built_on_demand() -> anyhow::Result<()> {
    let loader = make_loader();

    let ty = FieldType::parse("[[Ljava/io/IOException;")?;
    let first = loader.load_class(&ty)?;
    let second = loader.load_class(&ty)?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.name(), "[[Ljava/io/IOException;");
    assert_eq!(
        first.component_type().map(|c| c.name().to_string()),
        Some("[Ljava/io/IOException;".to_string())
    );
    assert_eq!(
        first.super_class().map(|c| c.name().to_string()),
        Some("java/lang/Object".to_string())
    );

    Ok(())
}
