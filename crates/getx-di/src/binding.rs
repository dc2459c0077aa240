#![forbid(unsafe_code)]

//! Bindings: declarative hooks that register a route's dependencies.
//!
//! A binding is invoked by [`Container::run_binding`] when its route becomes
//! active. Whatever it registers is owned by that route.

use crate::container::Container;

/// Registers dependencies into a container.
pub trait Binding {
    fn dependencies(&self, container: &Container);
}

/// A [`Binding`] built from a closure.
pub struct BindingsBuilder {
    builder: Box<dyn Fn(&Container)>,
}

impl BindingsBuilder {
    pub fn new(builder: impl Fn(&Container) + 'static) -> Self {
        Self {
            builder: Box::new(builder),
        }
    }
}

impl std::fmt::Debug for BindingsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingsBuilder").finish_non_exhaustive()
    }
}

impl Binding for BindingsBuilder {
    fn dependencies(&self, container: &Container) {
        (self.builder)(container);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::PutOptions;

    struct Settings {
        dark: bool,
    }

    struct SettingsBinding;

    impl Binding for SettingsBinding {
        fn dependencies(&self, container: &Container) {
            container.lazy_put(|_: &Container| Settings { dark: true }, PutOptions::default());
        }
    }

    #[test]
    fn trait_binding_registers() {
        let c = Container::new();
        c.run_binding("/settings", &SettingsBinding);
        assert!(c.find::<Settings>().expect("bound").dark);
    }

    #[test]
    fn builder_binding_registers() {
        let c = Container::new();
        let binding = BindingsBuilder::new(|c: &Container| {
            c.put(42u32);
        });
        c.run_binding("/", &binding);
        assert_eq!(*c.find::<u32>().expect("bound"), 42);
        assert_eq!(c.owner_of::<u32>(None).as_deref(), Some("/"));
    }
}
