//! A navigation source backed by `window.history`.

use std::rc::Rc;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys;
use crate::channel::{Channel, Subscription};
use crate::error::HistoryError;
use crate::history::{Location, NavigationSource};

fn js_error(call: &'static str) -> impl Fn(JsValue) -> HistoryError {
    move |value| HistoryError::Js {
        call,
        message: format!("{:?}", value),
    }
}

fn read_location(window: &web_sys::Window) -> Result<Location, HistoryError> {
    let location = window.location();
    Ok(Location {
        pathname: location.pathname().map_err(js_error("location.pathname"))?,
        search: location.search().map_err(js_error("location.search"))?,
        hash: location.hash().map_err(js_error("location.hash"))?,
    })
}

/// The browser's session history.
///
/// Listens to `popstate` and `hashchange` on the window for back/forward navigation and edits of
/// the hash. `history.pushState` does not fire `popstate`, so pushes and replaces made through this
/// source notify listeners directly. The window listeners are removed when this is dropped.
pub struct BrowserHistory {
    window: web_sys::Window,
    changes: Rc<Channel<Location>>,
    listeners: Vec<(String, Closure<dyn FnMut(web_sys::Event)>)>,
}

impl BrowserHistory {
    /// Attach to the current window.
    pub fn new() -> Result<Self, HistoryError> {
        let window = web_sys::window().ok_or(HistoryError::Unavailable("window"))?;
        let changes = Rc::new(Channel::new());
        let mut listeners = vec![];

        for event in ["popstate", "hashchange"].iter() {
            let source = window.clone();
            let changes = Rc::clone(&changes);
            let closure = Closure::wrap(
                Box::new(move |_event| {
                    match read_location(&source) {
                        Ok(location) => changes.publish(&location),
                        Err(e) => error!("ignoring location change: {}", e),
                    }
                }) as Box<dyn FnMut(web_sys::Event)>
            );

            window
                .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
                .map_err(js_error("addEventListener"))?;

            listeners.push((event.to_string(), closure));
        }

        Ok(BrowserHistory {
            window,
            changes,
            listeners,
        })
    }

    fn history(&self) -> Result<web_sys::History, HistoryError> {
        self.window.history().map_err(js_error("window.history"))
    }

    fn announce(&self) -> Result<(), HistoryError> {
        let location = read_location(&self.window)?;
        self.changes.publish(&location);
        Ok(())
    }
}

impl NavigationSource for BrowserHistory {
    fn current_location(&self) -> Location {
        read_location(&self.window).unwrap_or_else(|e| {
            error!("reading the current location: {}", e);
            Location::default()
        })
    }

    fn listen(&self, listener: Box<dyn Fn(&Location)>) -> Subscription {
        self.changes.subscribe(listener)
    }

    fn push(&self, url: &str) -> Result<(), HistoryError> {
        self.history()?
            .push_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(js_error("history.pushState"))?;
        self.announce()
    }

    fn replace(&self, url: &str) -> Result<(), HistoryError> {
        self.history()?
            .replace_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(js_error("history.replaceState"))?;
        self.announce()
    }
}

impl Drop for BrowserHistory {
    fn drop(&mut self) {
        for (event, listener) in self.listeners.drain(..) {
            if let Err(e) = self
                .window
                .remove_event_listener_with_callback(&event, listener.as_ref().unchecked_ref())
            {
                warn!("failed to remove {} listener: {:?}", event, e);
            }
        }
    }
}
