//! Slider controllers bound to light parameters.
//!
//! Every slider reads and writes the shared [`DataModel`], so a change shows
//! up on the next drawn frame without further plumbing.

use std::fmt;

use glam::Vec3;

use crate::data_model::DataModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn of(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    fn with(self, mut v: Vec3, value: f32) -> Vec3 {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
        v
    }
}

/// Scene parameter a slider edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderBinding {
    LightIntensity(&'static str),
    LightPosition(&'static str, Axis),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    pub label: &'static str,
    pub binding: SliderBinding,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Slider {
    /// Rounds to the nearest step, then clamps into range.
    pub fn snap(&self, value: f32) -> f32 {
        let step = f64::from(self.step);
        let snapped = if step > 0.0 {
            ((f64::from(value) / step).round() * step) as f32
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }

    /// One hundredth of the slider's range.
    pub fn coarse_step(&self) -> f32 {
        (self.max - self.min) / 100.0
    }
}

pub fn default_sliders() -> Vec<Slider> {
    let position = |label, axis| Slider {
        label,
        binding: SliderBinding::LightPosition("MoonLight", axis),
        min: -5.0,
        max: 5.0,
        step: 0.001,
    };
    vec![
        Slider {
            label: "ambient intensity",
            binding: SliderBinding::LightIntensity("AmbientLight"),
            min: 0.0,
            max: 1.0,
            step: 0.001,
        },
        Slider {
            label: "moon intensity",
            binding: SliderBinding::LightIntensity("MoonLight"),
            min: 0.0,
            max: 1.0,
            step: 0.001,
        },
        position("moon x", Axis::X),
        position("moon y", Axis::Y),
        position("moon z", Axis::Z),
    ]
}

pub struct DebugPanel {
    model: DataModel,
    sliders: Vec<Slider>,
    selected: usize,
}

impl DebugPanel {
    pub fn new(model: DataModel) -> Self {
        Self::with_sliders(model, default_sliders())
    }

    pub fn with_sliders(model: DataModel, sliders: Vec<Slider>) -> Self {
        Self {
            model,
            sliders,
            selected: 0,
        }
    }

    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    /// Current value of the bound parameter, `None` if the light is missing.
    pub fn value(&self, index: usize) -> Option<f32> {
        let slider = self.sliders.get(index)?;
        match slider.binding {
            SliderBinding::LightIntensity(light) => {
                self.model.read(|scene| scene.light(light).map(|l| l.intensity))
            }
            SliderBinding::LightPosition(light, axis) => self
                .model
                .read(|scene| scene.light(light).map(|l| axis.of(l.position))),
        }
    }

    /// Writes `value` through the slider and returns what was stored.
    ///
    /// Non-finite input leaves the parameter untouched and returns `None`.
    pub fn set(&self, index: usize, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let slider = self.sliders.get(index)?;
        let value = slider.snap(value);
        let applied = match slider.binding {
            SliderBinding::LightIntensity(light) => self.model.set_light_intensity(light, value),
            SliderBinding::LightPosition(light, axis) => {
                let position = self.model.read(|scene| scene.light(light).map(|l| l.position));
                match position {
                    Some(position) => self
                        .model
                        .set_light_position(light, axis.with(position, value)),
                    None => false,
                }
            }
        };
        applied.then_some(value)
    }

    /// Moves a slider by one step (`fine`) or by a hundredth of its range.
    pub fn nudge(&self, index: usize, direction: f32, fine: bool) -> Option<f32> {
        let slider = *self.sliders.get(index)?;
        let amount = if fine { slider.step } else { slider.coarse_step() };
        let current = self.value(index)?;
        self.set(index, current + direction.signum() * amount)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if !self.sliders.is_empty() {
            self.selected = (self.selected + 1) % self.sliders.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.sliders.is_empty() {
            self.selected = (self.selected + self.sliders.len() - 1) % self.sliders.len();
        }
    }

    pub fn nudge_selected(&self, direction: f32, fine: bool) -> Option<f32> {
        self.nudge(self.selected, direction, fine)
    }

    /// One-line description of the selected slider, e.g. `moon x = 4.000`.
    pub fn summary(&self) -> String {
        match self.sliders.get(self.selected) {
            Some(slider) => match self.value(self.selected) {
                Some(value) => format!("{} = {value:.3}", slider.label),
                None => format!("{} (unbound)", slider.label),
            },
            None => String::from("no sliders"),
        }
    }
}

impl fmt::Display for DebugPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, slider) in self.sliders.iter().enumerate() {
            let marker = if index == self.selected { '>' } else { ' ' };
            match self.value(index) {
                Some(value) => writeln!(
                    f,
                    "{marker} {:<18} {value:>7.3}  [{}, {}]",
                    slider.label, slider.min, slider.max
                )?,
                None => writeln!(f, "{marker} {:<18}   (unbound)", slider.label)?,
            }
        }
        Ok(())
    }
}
