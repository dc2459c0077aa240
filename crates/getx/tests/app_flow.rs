//! End-to-end flow through the prelude.
//!
//! A page binding registers a controller whose status cell loads data
//! asynchronously; an observer renders it; navigating away closes it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::executor::block_on;
use getx::prelude::*;

#[derive(Debug)]
struct Offline;

impl fmt::Display for Offline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("offline")
    }
}

impl std::error::Error for Offline {}

struct InboxController {
    messages: StateCell<Vec<String>>,
    unread: RxList<String>,
}

impl InboxController {
    fn load(&self, result: Result<Vec<String>, Offline>) -> impl Future<Output = ()> {
        self.messages.run_async(move || async move { result })
    }
}

impl Controller for InboxController {
    fn on_close(&self) {
        self.messages.dispose();
        self.unread.dispose();
    }
}

fn app() -> NavState {
    let tree = RouteTree::new([
        PageDescriptor::new("/").with_title("Home"),
        PageDescriptor::new("/inbox")
            .with_title("Inbox")
            .with_binding(BindingsBuilder::new(|c: &Container| {
                c.lazy_put_controller(
                    |_: &Container| InboxController {
                        messages: StateCell::new(),
                        unread: RxList::new(),
                    },
                    PutOptions::default(),
                );
            })),
    ])
    .expect("valid routes");
    NavState::new(tree, Rc::new(Container::new()))
}

fn render(status: &Status<Vec<String>>) -> String {
    match status {
        Status::Loading => "loading".into(),
        Status::Success(list) => list.join(","),
        Status::Empty => "nothing".into(),
        Status::Error(err) => format!("error: {err}"),
        Status::Custom(label) => label.clone(),
    }
}

#[test]
fn inbox_loads_renders_and_closes() {
    let nav = app();
    nav.to_named("/inbox").expect("navigates");
    let ctrl = nav
        .container()
        .find::<InboxController>()
        .expect("lazily built");

    let frames = Rc::new(RefCell::new(Vec::new()));
    let (c, f) = (Rc::clone(&ctrl), Rc::clone(&frames));
    let view = Observer::new(move || {
        let status = c.messages.status();
        f.borrow_mut().push(render(&status));
    });

    block_on(ctrl.load(Ok(vec!["a".into(), "b".into()])));
    block_on(ctrl.load(Ok(Vec::new())));
    block_on(ctrl.load(Err(Offline)));
    assert_eq!(
        *frames.borrow(),
        ["loading", "a,b", "loading", "nothing", "loading", "error: offline"]
    );

    nav.to_named("/").expect("navigates");
    assert!(ctrl.messages.is_disposed());
    assert!(!nav.container().is_registered::<InboxController>(None));
    view.dispose();
}

#[test]
fn workers_watch_list_and_status() {
    let nav = app();
    nav.to_named("/inbox").expect("navigates");
    let ctrl = nav
        .container()
        .find::<InboxController>()
        .expect("lazily built");

    let events = Rc::new(RefCell::new(Vec::new()));
    let e = Rc::clone(&events);
    let _worker = ever_all(&[&ctrl.unread as &dyn Listenable, &ctrl.messages], move || {
        e.borrow_mut().push("change");
    });
    ctrl.unread.add("x".to_string());
    ctrl.messages.set_custom("syncing");
    assert_eq!(events.borrow().len(), 2);
}
