//! # Gamepads
//!
//! A [`Gamepad`] reads named controls (sticks, triggers, buttons, the POV hat) from an
//! [`InputSource`] through a [`GamepadLayout`]. Layouts are parameter data, one per supported
//! [`GamepadModel`], so the processing code never deals in raw indices.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hw_if::input::InputSource;

use super::shaping;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Raw indices of every control on a gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GamepadLayout {
    pub left_x: usize,
    pub left_y: usize,
    pub right_x: usize,
    pub right_y: usize,
    pub left_trigger: TriggerSource,
    pub right_trigger: TriggerSource,

    pub a: usize,
    pub b: usize,
    pub x: usize,
    pub y: usize,
    pub left_bumper: usize,
    pub right_bumper: usize,
    pub back: usize,
    pub start: usize,

    pub pov: usize,
}

/// The layout for each supported gamepad model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadLayouts {
    pub xbox_360: GamepadLayout,
    pub logitech_f310: GamepadLayout,
    pub logitech_dual_action: GamepadLayout,
}

/// A gamepad read through a layout.
#[derive(Clone)]
pub struct Gamepad {
    input: Arc<dyn InputSource>,
    layout: GamepadLayout,
    deadband: f64,
}

/// Rising edge detector for a button.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeDetector {
    last: bool,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Supported gamepad models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamepadModel {
    Xbox360,
    LogitechF310,
    LogitechDualAction,
}

/// Triggers are analog axes on some gamepads and plain buttons on others.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TriggerSource {
    Axis(usize),
    Button(usize),
}

/// Named analog controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

/// Named buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Button {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    Back,
    Start,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl GamepadModel {
    /// Parse the model name stored in the preferences.
    ///
    /// Unknown names are logged and the default model used instead.
    pub fn from_pref(name: &str) -> Self {
        match name {
            "Xbox360Gamepad" | "Xbox360" | "Default" => GamepadModel::Xbox360,
            "LogitechF310Gamepad" | "LogitechF310" => GamepadModel::LogitechF310,
            "LogitechDualActionGamepad" | "LogitechDualAction" => {
                GamepadModel::LogitechDualAction
            }
            _ => {
                error!(
                    "Unknown gamepad model \"{}\", using {:?}",
                    name,
                    GamepadModel::default()
                );
                GamepadModel::default()
            }
        }
    }
}

impl Default for GamepadModel {
    fn default() -> Self {
        GamepadModel::Xbox360
    }
}

impl GamepadLayouts {
    pub fn layout(&self, model: GamepadModel) -> GamepadLayout {
        match model {
            GamepadModel::Xbox360 => self.xbox_360,
            GamepadModel::LogitechF310 => self.logitech_f310,
            GamepadModel::LogitechDualAction => self.logitech_dual_action,
        }
    }
}

impl Default for GamepadLayouts {
    fn default() -> Self {
        // The F310 in XInput mode reports the same indices as the Xbox 360 pad
        let xinput = GamepadLayout {
            left_x: 0,
            left_y: 1,
            right_x: 4,
            right_y: 5,
            left_trigger: TriggerSource::Axis(2),
            right_trigger: TriggerSource::Axis(3),
            a: 1,
            b: 2,
            x: 3,
            y: 4,
            left_bumper: 5,
            right_bumper: 6,
            back: 7,
            start: 8,
            pov: 0,
        };

        Self {
            xbox_360: xinput,
            logitech_f310: xinput,
            logitech_dual_action: GamepadLayout {
                left_x: 0,
                left_y: 1,
                right_x: 2,
                right_y: 3,
                left_trigger: TriggerSource::Button(7),
                right_trigger: TriggerSource::Button(8),
                a: 2,
                b: 3,
                x: 1,
                y: 4,
                left_bumper: 5,
                right_bumper: 6,
                back: 9,
                start: 10,
                pov: 0,
            },
        }
    }
}

impl Gamepad {
    pub fn new(input: Arc<dyn InputSource>, layout: GamepadLayout, deadband: f64) -> Self {
        Self {
            input,
            layout,
            deadband,
        }
    }

    /// Raw value of an analog control.
    ///
    /// Button triggers read as either 0.0 or 1.0.
    pub fn axis(&self, axis: Axis) -> f64 {
        let l = &self.layout;

        match axis {
            Axis::LeftX => self.input.axis(l.left_x),
            Axis::LeftY => self.input.axis(l.left_y),
            Axis::RightX => self.input.axis(l.right_x),
            Axis::RightY => self.input.axis(l.right_y),
            Axis::LeftTrigger => self.trigger(l.left_trigger),
            Axis::RightTrigger => self.trigger(l.right_trigger),
        }
    }

    /// Value of an analog control with the deadband applied.
    pub fn axis_db(&self, axis: Axis) -> f64 {
        shaping::deadband(self.axis(axis), self.deadband)
    }

    pub fn button(&self, button: Button) -> bool {
        let l = &self.layout;

        let index = match button {
            Button::A => l.a,
            Button::B => l.b,
            Button::X => l.x,
            Button::Y => l.y,
            Button::LeftBumper => l.left_bumper,
            Button::RightBumper => l.right_bumper,
            Button::Back => l.back,
            Button::Start => l.start,
        };

        self.input.button(index)
    }

    /// Angle of the POV hat in degrees, `None` when released.
    pub fn pov(&self) -> Option<u16> {
        self.input.pov(self.layout.pov)
    }

    pub fn is_zero(&self, value: f64) -> bool {
        shaping::is_zero(value, self.deadband)
    }

    fn trigger(&self, source: TriggerSource) -> f64 {
        match source {
            TriggerSource::Axis(i) => self.input.axis(i),
            TriggerSource::Button(i) => {
                if self.input.button(i) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current button state, returns true only on the press.
    pub fn rising(&mut self, pressed: bool) -> bool {
        let edge = pressed && !self.last;
        self.last = pressed;
        edge
    }

    pub fn reset(&mut self) {
        self.last = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hw_if::sim::SimInput;

    #[test]
    fn test_model_from_pref() {
        assert_eq!(GamepadModel::from_pref("Xbox360Gamepad"), GamepadModel::Xbox360);
        assert_eq!(GamepadModel::from_pref("Default"), GamepadModel::Xbox360);
        assert_eq!(
            GamepadModel::from_pref("LogitechF310Gamepad"),
            GamepadModel::LogitechF310
        );
        assert_eq!(
            GamepadModel::from_pref("LogitechDualAction"),
            GamepadModel::LogitechDualAction
        );
        assert_eq!(GamepadModel::from_pref("xbox"), GamepadModel::Xbox360);
        assert_eq!(GamepadModel::from_pref(""), GamepadModel::Xbox360);
    }

    #[test]
    fn test_button_triggers() {
        let input = Arc::new(SimInput::new());
        let layout = GamepadLayouts::default().layout(GamepadModel::LogitechDualAction);
        let pad = Gamepad::new(input.clone(), layout, shaping::DEFAULT_DEADBAND);

        assert_eq!(pad.axis(Axis::RightTrigger), 0.0);
        input.set_button(8, true);
        assert_eq!(pad.axis(Axis::RightTrigger), 1.0);
        assert_eq!(pad.axis(Axis::LeftTrigger), 0.0);

        input.set_button(2, true);
        assert!(pad.button(Button::A));
        assert!(!pad.button(Button::B));
    }

    #[test]
    fn test_axis_deadband() {
        let input = Arc::new(SimInput::new());
        let layout = GamepadLayouts::default().layout(GamepadModel::Xbox360);
        let pad = Gamepad::new(input.clone(), layout, shaping::DEFAULT_DEADBAND);

        input.set_axis(1, 0.03);
        input.set_axis(4, -0.6);
        assert_eq!(pad.axis(Axis::LeftY), 0.03);
        assert_eq!(pad.axis_db(Axis::LeftY), 0.0);
        assert_eq!(pad.axis_db(Axis::RightX), -0.6);
        assert!(pad.is_zero(0.049));

        assert_eq!(pad.pov(), None);
        input.set_pov(0, Some(90));
        assert_eq!(pad.pov(), Some(90));
    }

    #[test]
    fn test_layouts_from_toml() {
        let toml_str = r#"
            [logitech_f310]
            left_x = 0
            left_y = 1
            right_x = 3
            right_y = 4
            left_trigger = { Axis = 2 }
            right_trigger = { Button = 9 }
            a = 1
            b = 2
            x = 3
            y = 4
            left_bumper = 5
            right_bumper = 6
            back = 7
            start = 8
            pov = 0
        "#;

        let layouts: GamepadLayouts = util::params::parse(toml_str).unwrap();

        let f310 = layouts.layout(GamepadModel::LogitechF310);
        assert_eq!(f310.right_y, 4);
        assert_eq!(f310.right_trigger, TriggerSource::Button(9));

        // Missing models keep their defaults
        assert_eq!(
            layouts.layout(GamepadModel::Xbox360),
            GamepadLayouts::default().xbox_360
        );
    }

    #[test]
    fn test_edge_detector() {
        let mut edge = EdgeDetector::new();

        assert!(!edge.rising(false));
        assert!(edge.rising(true));
        assert!(!edge.rising(true));
        assert!(!edge.rising(false));
        assert!(edge.rising(true));

        edge.reset();
        assert!(edge.rising(true));
    }
}
