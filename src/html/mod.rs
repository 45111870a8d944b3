use chrono::{DateTime, Utc};
use maud::{html, Markup};

use crate::api::*;
use crate::data::*;

pub mod components;
pub mod pages;
mod wrappers;
