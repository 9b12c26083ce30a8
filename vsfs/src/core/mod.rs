// SPDX-License-Identifier: MIT

pub mod checker;
pub mod errors;
pub mod macros;
pub mod meta;
pub mod utils;
