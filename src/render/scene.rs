//! Retained dial scene shared by the bundled renderers.
//!
//! A [`DialScene`] is the set of visual elements that make up one clock.
//! [`DialScene::rebuild`] throws every element away and starts a new
//! generation; [`DialScene::patch`] updates the existing elements in place.

use chrono::NaiveDateTime;

use super::geometry::HandAngles;
use crate::config::ClockConfig;

/// One visual element of the dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialElement {
    /// Clock face.
    Face {
        /// Diameter.
        size: i32,
        /// Fill colour.
        color: String,
    },
    /// Hour hand.
    HourHand {
        /// Stroke colour.
        color: String,
    },
    /// Minute hand.
    MinuteHand {
        /// Stroke colour.
        color: String,
    },
    /// Seconds hand; present only in seconds mode.
    SecondHand {
        /// Stroke colour.
        color: String,
    },
    /// Caption under the dial.
    Label(String),
}

/// Retained set of dial elements plus the last painted time.
#[derive(Debug, Clone, PartialEq)]
pub struct DialScene {
    elements: Vec<DialElement>,
    generation: u64,
    shown: Option<NaiveDateTime>,
}

impl DialScene {
    /// Build the elements for `config` as generation 0.
    pub fn build(config: &ClockConfig) -> Self {
        Self {
            elements: elements_for(config),
            generation: 0,
            shown: None,
        }
    }

    /// Discard all elements and recreate them for `config`.
    pub fn rebuild(&mut self, config: &ClockConfig) {
        self.elements = elements_for(config);
        self.generation += 1;
    }

    /// Update colours, size and label in place.
    ///
    /// Hands are never added or removed here; that is a rebuild.
    pub fn patch(&mut self, config: &ClockConfig) {
        let visual = &config.visual;
        for element in &mut self.elements {
            match element {
                DialElement::Face { size, color } => {
                    *size = visual.size;
                    color.clone_from(&visual.face_color);
                }
                DialElement::HourHand { color } | DialElement::MinuteHand { color } => {
                    color.clone_from(&visual.hand_color);
                }
                DialElement::SecondHand { color } => color.clone_from(&visual.accent_color),
                DialElement::Label(_) => {}
            }
        }

        match (&visual.label, self.label_index()) {
            (Some(text), Some(idx)) => self.elements[idx] = DialElement::Label(text.clone()),
            (Some(text), None) => self.elements.push(DialElement::Label(text.clone())),
            (None, Some(idx)) => {
                self.elements.remove(idx);
            }
            (None, None) => {}
        }
    }

    /// Record the time the hands now point at.
    pub fn set_time(&mut self, now: NaiveDateTime) {
        self.shown = Some(now);
    }

    /// Visual elements, in paint order.
    pub fn elements(&self) -> &[DialElement] {
        &self.elements
    }

    /// Incremented on every rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last time passed to [`set_time`](Self::set_time).
    pub fn shown(&self) -> Option<NaiveDateTime> {
        self.shown
    }

    /// Hand angles for the shown time.
    pub fn angles(&self) -> Option<HandAngles> {
        self.shown.as_ref().map(HandAngles::at)
    }

    /// Whether a seconds hand element exists.
    pub fn has_second_hand(&self) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, DialElement::SecondHand { .. }))
    }

    /// Current label text, if any.
    pub fn label(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            DialElement::Label(text) => Some(text.as_str()),
            _ => None,
        })
    }

    fn label_index(&self) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| matches!(e, DialElement::Label(_)))
    }
}

fn elements_for(config: &ClockConfig) -> Vec<DialElement> {
    let visual = &config.visual;
    let mut elements = vec![
        DialElement::Face {
            size: visual.size,
            color: visual.face_color.clone(),
        },
        DialElement::HourHand {
            color: visual.hand_color.clone(),
        },
        DialElement::MinuteHand {
            color: visual.hand_color.clone(),
        },
    ];
    if config.display_mode.shows_seconds() {
        elements.push(DialElement::SecondHand {
            color: visual.accent_color.clone(),
        });
    }
    if let Some(label) = &visual.label {
        elements.push(DialElement::Label(label.clone()));
    }
    elements
}
