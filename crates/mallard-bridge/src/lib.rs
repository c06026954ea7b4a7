// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Mallard — native module bridge.
//!
//! Native capabilities are declared as [`NativeModule`]s, collected once
//! into a [`ModuleRegistry`], and invoked by name through a [`CallBridge`].
//! Each call carries a one-shot [`CompletionHandle`] that delivers exactly
//! one result back to the embedded scripting runtime.

pub mod args;
pub mod completion;
pub mod dispatch;
pub mod loader;
pub mod registry;
pub mod traits;

pub use args::Args;
pub use completion::CompletionHandle;
pub use dispatch::{CallBridge, InvocationRequest};
pub use loader::{NativeLoader, ProcessLoader, is_process_loaded, platform_loader};
pub use registry::ModuleRegistry;
pub use traits::{Handler, Method, MethodTable, NativeModule};
