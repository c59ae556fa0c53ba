// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed event namespace.
//!
//! Wire format: `hfo.gen<G>.<infix>.<action>` where `<infix>` embeds the
//! owning port where the component has one (`p7.spell_gate`) and is bare
//! where it does not (`meadows`, `kraken`). Changing a rendered string is
//! a breaking change: it is the only coordination key between daemons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability port tag. Organizational only, not a network port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Port {
    P0,
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
    P7,
    Infra,
}

impl Port {
    /// Lowercase wire segment (`p0`..`p7`, `infra`).
    pub fn segment(self) -> &'static str {
        match self {
            Port::P0 => "p0",
            Port::P1 => "p1",
            Port::P2 => "p2",
            Port::P3 => "p3",
            Port::P4 => "p4",
            Port::P5 => "p5",
            Port::P6 => "p6",
            Port::P7 => "p7",
            Port::Infra => "infra",
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Infra => write!(f, "INFRA"),
            other => write!(f, "{}", other.segment().to_uppercase()),
        }
    }
}

/// Every component that publishes events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    SpellGate,
    Anchor,
    Watcher,
    Singer,
    Prospector,
    Meadows,
    Kraken,
    ComputeQueue,
    Wish,
}

impl Component {
    /// Dotted infix between the generation segment and the action.
    pub fn infix(self) -> &'static str {
        match self {
            Component::SpellGate => "p7.spell_gate",
            Component::Anchor => "p7.dimensional_anchor",
            Component::Watcher => "p0.watcher",
            Component::Singer => "p4.singer",
            Component::Prospector => "p4.song_prospector",
            Component::Meadows => "meadows",
            Component::Kraken => "kraken",
            Component::ComputeQueue => "p7.compute_queue",
            Component::Wish => "p7.wish.v2",
        }
    }

    /// Owning port, where the component has one.
    pub fn port(self) -> Option<Port> {
        match self {
            Component::SpellGate | Component::Anchor | Component::ComputeQueue | Component::Wish => {
                Some(Port::P7)
            }
            Component::Watcher => Some(Port::P0),
            Component::Singer | Component::Prospector => Some(Port::P4),
            Component::Kraken => Some(Port::P6),
            Component::Meadows => None,
        }
    }

    /// Underscored slug used in publisher source tags.
    pub fn source_slug(self) -> &'static str {
        match self {
            Component::SpellGate => "p7_spell_gate",
            Component::Anchor => "p7_dimensional_anchor",
            Component::Watcher => "p0_watcher",
            Component::Singer => "singer_daemon",
            Component::Prospector => "song_prospector",
            Component::Meadows => "meadows_engine",
            Component::Kraken => "p6_kraken_loop",
            Component::ComputeQueue => "p7_compute_queue",
            Component::Wish => "p7_wish_compiler",
        }
    }

    /// LIKE prefix matching every event this component publishes.
    pub fn like_prefix(self, generation: &str) -> String {
        format!("hfo.gen{generation}.{}.%", self.infix())
    }
}

/// A compile-time event type: component + static action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventType {
    pub component: Component,
    pub action: &'static str,
}

impl EventType {
    pub const fn new(component: Component, action: &'static str) -> Self {
        Self { component, action }
    }

    /// Render the dotted wire string for a generation tag.
    pub fn render(&self, generation: &str) -> String {
        format!(
            "hfo.gen{generation}.{}.{}",
            self.component.infix(),
            self.action
        )
    }
}

#[cfg(test)]
#[path = "event_type_tests.rs"]
mod tests;
