// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Exchange Module
 * Intake of captured HTTP exchanges and construction of target records
 *
 * © 2026 Bountyy Oy
 */

pub mod message;
pub mod parser;
pub mod record;

pub use message::{HttpRequest, HttpResponse};
pub use parser::{ExchangeParser, RawHttpParser};
pub use record::{RawExchange, TargetRecord};
