mod common;

use std::{sync::Arc, thread};

use common::{make_loader, CountingLoader, TestClass};
use parse::flags::MethodAccessFlag;
use runtime::native::{NativeFunction, NativeRegistry};

const THREADS: usize = 8;

#[test]
fn racing_resolutions_converge() -> anyhow::Result<()> {
    let loader = CountingLoader::new(make_loader());
    let class = loader.define(
        TestClass::new("com/example/Shared")
            .method(
                MethodAccessFlag::PUBLIC | MethodAccessFlag::ABSTRACT,
                "merge",
                "(Ljava/lang/String;[I[[Ljava/lang/Exception;J)V",
            )
            .build(),
    )?;
    let method = class.methods()[0].clone();

    let results = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| method.parameter_types()))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("resolver thread panicked"))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let published = method.parameter_types()?;
    for types in &results {
        assert!(Arc::ptr_eq(types, &published));
    }
    assert_eq!(published.len(), 4);

    Ok(())
}

#[test]
fn concurrent_lookups_share_catch_types() -> anyhow::Result<()> {
    let loader = make_loader();
    let class = loader.define_class(
        TestClass::new("com/example/Worker")
            .code_method(
                MethodAccessFlag::STATIC,
                "work",
                "()V",
                32,
                &[
                    (0, 16, 20, Some("java/io/IOException")),
                    (0, 16, 24, Some("java/lang/Exception")),
                ],
            )
            .build(),
    )?;
    let method = class.get_method("work", "()V").expect("method");
    let io = loader.find_class("java/io/IOException").expect("io");
    let runtime = loader
        .find_class("java/lang/RuntimeException")
        .expect("runtime");

    thread::scope(|scope| {
        for worker in 0..THREADS {
            let (thrown, expected) = if worker % 2 == 0 {
                (&io, 20)
            } else {
                (&runtime, 24)
            };
            let method = &method;

            scope.spawn(move || {
                for pc in 0..16 {
                    let handler = method
                        .find_exception_handler(pc, thrown)
                        .expect("catch types to resolve");
                    assert_eq!(handler, Some(expected));
                }
            });
        }
    });

    Ok(())
}

#[test]
fn racing_binders_bind_every_native_once() -> anyhow::Result<()> {
    let natives = [("now", "()J"), ("nanos", "()J"), ("offset", "(J)J")];

    let loader = make_loader();
    let mut class = TestClass::new("com/example/Clock");
    for (name, descriptor) in natives {
        class = class.method(
            MethodAccessFlag::PUBLIC | MethodAccessFlag::STATIC | MethodAccessFlag::NATIVE,
            name,
            descriptor,
        );
    }
    let class = loader.define_class(class.build())?;

    let registry = NativeRegistry::new();
    for method in natives {
        registry.register(
            "com/example/Clock",
            method,
            NativeFunction::Static(|_, _| Ok(None)),
        )?;
    }

    let results = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| registry.bind(&class)))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("binder thread panicked"))
            .collect::<Result<Vec<_>, _>>()
    })?;

    assert_eq!(results.iter().sum::<usize>(), natives.len());
    assert!(class
        .methods()
        .iter()
        .all(|method| method.native_handle().is_registered()));

    Ok(())
}
