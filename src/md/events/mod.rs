/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::cosmic::AstroError;
use crate::md::trajectory::TrajError;
use snafu::prelude::*;

pub mod condition;
pub use condition::*;
pub mod details;
pub use details::*;
pub mod engine;
pub use engine::*;
pub mod recorder;
pub use recorder::*;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EventError {
    #[snafu(display("during an event computation: {source}"))]
    EventAstro { source: AstroError },
    #[snafu(display("when searching the event in the trajectory: {source}"))]
    EventTraj { source: TrajError },
    #[snafu(display("invalid stopping condition: {msg}"))]
    InvalidCondition { msg: String },
}

impl From<TrajError> for EventError {
    fn from(source: TrajError) -> Self {
        Self::EventTraj { source }
    }
}
