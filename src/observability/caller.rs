//! Call-site attribution.
//!
//! # Responsibilities
//! - Name the component that issued a log call (the record's `class`)
//!
//! # Design Decisions
//! - Every facade method is `#[track_caller]`, so `Location::caller()` already
//!   points past the logging machinery; no frames are walked or skipped
//! - An explicit component name registered on the logger wins over the
//!   location-derived name
//! - Attribution never fails: unknown call sites yield an empty name

use std::panic::Location;
use std::path::Path;

/// File stems that name their directory rather than a component.
const DIRECTORY_STEMS: [&str; 3] = ["mod", "lib", "main"];

/// Resolved origin of a log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    /// The caller of the enclosing `#[track_caller]` chain.
    #[track_caller]
    pub fn capture() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// Component name derived from the source file.
    ///
    /// `src/http/middleware.rs` → `middleware`, `src/http/mod.rs` → `http`.
    pub fn component(&self) -> String {
        component_from_path(self.file)
    }
}

/// Resolve the `class` of a record: explicit component first, then call site.
pub fn resolve_class(component: Option<&str>, site: &CallSite) -> String {
    match component {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => site.component(),
    }
}

fn component_from_path(file: &str) -> String {
    let path = Path::new(file);
    let stem = match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem,
        None => return String::new(),
    };

    if DIRECTORY_STEMS.contains(&stem) {
        return path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_default();
    }
    stem.to_string()
}
