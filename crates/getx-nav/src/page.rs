#![forbid(unsafe_code)]

//! Page descriptors: a named route pattern with bindings and children.

use std::fmt;
use std::rc::Rc;

use getx_di::Binding;

/// A page in the route tree.
///
/// `name` is a path pattern such as `/users/:id`. Child names are relative
/// to their parent; once a [`RouteTree`](crate::RouteTree) is built, every
/// descriptor it hands out carries its absolute pattern.
#[derive(Clone)]
pub struct PageDescriptor {
    name: String,
    title: Option<String>,
    bindings: Vec<Rc<dyn Binding>>,
    children: Vec<PageDescriptor>,
}

impl PageDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            bindings: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a binding run when the page enters the active branch.
    #[must_use]
    pub fn with_binding(mut self, binding: impl Binding + 'static) -> Self {
        self.bindings.push(Rc::new(binding));
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = PageDescriptor>) -> Self {
        self.children.extend(children);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn bindings(&self) -> &[Rc<dyn Binding>] {
        &self.bindings
    }

    #[must_use]
    pub fn children(&self) -> &[PageDescriptor] {
        &self.children
    }

    pub(crate) fn with_name(&self, name: String) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }
}

impl fmt::Debug for PageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDescriptor")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("bindings", &self.bindings.len())
            .field("children", &self.children)
            .finish()
    }
}

impl PartialEq for PageDescriptor {
    /// Pages are equal when their patterns are; bindings are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PageDescriptor {}
