//! Interceptor hooks that can veto a parse or a network request.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

/// Events hooks can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
  /// Before JSON is turned into a document and rendered
  Parse,
  /// Before any network fetch
  Request,
}

impl HookEvent {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Parse => "parse",
      Self::Request => "request",
    }
  }
}

impl fmt::Display for HookEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Returned when parsing an event name nobody listens for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hook event '{0}'")]
pub struct UnknownHookEvent(pub String);

impl FromStr for HookEvent {
  type Err = UnknownHookEvent;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "parse" => Ok(Self::Parse),
      "request" => Ok(Self::Request),
      other => Err(UnknownHookEvent(other.to_string())),
    }
  }
}

/// Arguments handed to every hook of an event.
#[derive(Debug, Clone, Copy)]
pub enum HookContext<'a> {
  Parse {
    json: &'a Value,
    template_url: &'a str,
  },
  Request {
    url: &'a str,
  },
}

impl HookContext<'_> {
  pub fn event(&self) -> HookEvent {
    match self {
      Self::Parse { .. } => HookEvent::Parse,
      Self::Request { .. } => HookEvent::Request,
    }
  }
}

/// A hook returns `false` to veto the operation.
pub type Hook = Arc<dyn Fn(&HookContext<'_>) -> bool + Send + Sync>;

/// Ordered hook lists, one per event.
///
/// Hooks are never removed once registered.
#[derive(Default)]
pub struct HookRegistry {
  parse: RwLock<Vec<Hook>>,
  request: RwLock<Vec<Hook>>,
}

impl HookRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a hook by event name.
  ///
  /// Unknown names are ignored. Returns whether the hook was registered.
  pub fn on<F>(&self, event: &str, hook: F) -> bool
  where
    F: Fn(&HookContext<'_>) -> bool + Send + Sync + 'static,
  {
    match event.parse::<HookEvent>() {
      Ok(event) => {
        self.on_event(event, hook);
        true
      }
      Err(e) => {
        tracing::debug!("Ignoring hook registration: {}", e);
        false
      }
    }
  }

  /// Register a hook for a known event.
  pub fn on_event<F>(&self, event: HookEvent, hook: F)
  where
    F: Fn(&HookContext<'_>) -> bool + Send + Sync + 'static,
  {
    let mut hooks = match self.list(event).write() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    hooks.push(Arc::new(hook));
  }

  /// Run every hook for the context's event, in registration order.
  ///
  /// All hooks run even after one has vetoed, so each of them observes every
  /// attempt. With no hooks registered the operation proceeds.
  pub fn should_proceed(&self, ctx: &HookContext<'_>) -> bool {
    let event = ctx.event();
    // Hooks may register further hooks, so none run under the lock
    let hooks: Vec<Hook> = match self.list(event).read() {
      Ok(guard) => guard.iter().cloned().collect(),
      Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
    };

    let proceed = hooks.iter().fold(true, |proceed, hook| hook(ctx) && proceed);

    if !proceed {
      tracing::debug!(event = %event, "Operation vetoed by hook");
    }
    proceed
  }

  /// Number of hooks registered for an event.
  pub fn len(&self, event: HookEvent) -> usize {
    match self.list(event).read() {
      Ok(guard) => guard.len(),
      Err(poisoned) => poisoned.into_inner().len(),
    }
  }

  fn list(&self, event: HookEvent) -> &RwLock<Vec<Hook>> {
    match event {
      HookEvent::Parse => &self.parse,
      HookEvent::Request => &self.request,
    }
  }
}

impl fmt::Debug for HookRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HookRegistry")
      .field("parse", &self.len(HookEvent::Parse))
      .field("request", &self.len(HookEvent::Request))
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  fn request(url: &str) -> HookContext<'_> {
    HookContext::Request { url }
  }

  #[test]
  fn test_empty_registry_proceeds() {
    let hooks = HookRegistry::new();
    assert!(hooks.should_proceed(&request("http://x")));
  }

  #[test]
  fn test_event_names() {
    assert_eq!("parse".parse::<HookEvent>(), Ok(HookEvent::Parse));
    assert_eq!("request".parse::<HookEvent>(), Ok(HookEvent::Request));
    assert!("Parse".parse::<HookEvent>().is_err());
    assert_eq!(HookEvent::Request.to_string(), "request");
  }

  #[test]
  fn test_unknown_event_is_ignored() {
    let hooks = HookRegistry::new();
    assert!(!hooks.on("render", |_| false));
    assert_eq!(hooks.len(HookEvent::Parse), 0);
    assert_eq!(hooks.len(HookEvent::Request), 0);
    assert!(hooks.should_proceed(&request("http://x")));
  }

  #[test]
  fn test_veto() {
    let hooks = HookRegistry::new();
    assert!(hooks.on("request", |ctx| match ctx {
      HookContext::Request { url } => !url.contains("blocked"),
      _ => true,
    }));

    assert!(hooks.should_proceed(&request("http://ok")));
    assert!(!hooks.should_proceed(&request("http://blocked")));
  }

  #[test]
  fn test_all_hooks_run_after_a_veto() {
    let hooks = HookRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));

    hooks.on("request", |_| false);
    let counter = calls.clone();
    hooks.on("request", move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
      true
    });

    assert!(!hooks.should_proceed(&request("http://x")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_hooks_run_in_registration_order_with_same_arguments() {
    let hooks = HookRegistry::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for n in 0..3 {
      let seen = seen.clone();
      hooks.on_event(HookEvent::Parse, move |ctx| {
        if let HookContext::Parse { template_url, .. } = ctx {
          seen.lock().unwrap().push(format!("{n}:{template_url}"));
        }
        true
      });
    }

    let json = serde_json::json!({"a": 1});
    let ctx = HookContext::Parse {
      json: &json,
      template_url: "t.xsl",
    };
    assert!(hooks.should_proceed(&ctx));
    assert_eq!(*seen.lock().unwrap(), vec!["0:t.xsl", "1:t.xsl", "2:t.xsl"]);
  }

  #[test]
  fn test_hook_can_register_another_hook() {
    let hooks = Arc::new(HookRegistry::new());
    let registry = Arc::clone(&hooks);
    hooks.on("request", move |_| {
      registry.on("request", |_| false);
      true
    });

    // Hooks added while running take effect from the next call
    assert!(hooks.should_proceed(&request("http://x")));
    assert_eq!(hooks.len(HookEvent::Request), 2);
    assert!(!hooks.should_proceed(&request("http://x")));
    assert_eq!(hooks.len(HookEvent::Request), 3);
  }

  #[test]
  fn test_events_are_independent() {
    let hooks = HookRegistry::new();
    hooks.on("parse", |_| false);

    let json = serde_json::Value::Null;
    assert!(hooks.should_proceed(&request("http://x")));
    assert!(!hooks.should_proceed(&HookContext::Parse {
      json: &json,
      template_url: "t",
    }));
  }
}
