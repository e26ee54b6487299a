// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;
pub mod loader;

pub use self::core::{ScannerConfig, DEFAULT_CONCURRENCY};
pub use self::loader::{load_signature_dir, ConfigFormat, ConfigLoader};
