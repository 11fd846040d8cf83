//! Macros for ergonomic event declarations.

/// Declare event types and implement [`Event`](crate::Event) for them.
///
/// Each declaration derives `Clone` and `Debug`; unit structs and structs
/// with named payload fields are both accepted.
///
/// # Example
///
/// ```
/// use statecraft::events;
///
/// events! {
///     pub struct PowerOn;
///     pub struct Temperature { pub celsius: i32 }
///     struct Calibrate;
/// }
///
/// let _ = Temperature { celsius: 21 };
/// ```
#[macro_export]
macro_rules! events {
    () => {};

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name;

        $crate::events!(@impl $name);
        $crate::events!($($rest)*);
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($body:tt)* }
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name { $($body)* }

        $crate::events!(@impl $name);
        $crate::events!($($rest)*);
    };

    (@impl $name:ident) => {
        impl $crate::Event for $name {
            fn boxed_clone(&self) -> ::std::boxed::Box<dyn $crate::Event> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn kind_name(&self) -> &'static str {
                ::std::any::type_name::<$name>()
            }
        }
    };
}
