//! Composed per-element style
//!
//! Several timeline segments can drive different properties of the same
//! element, but CSS only has one `transform`. The view keeps one
//! `ElementStyle` per element and writes the composed strings on flush.

use glam::DVec3;

use crate::fx::PropertyName;

/// Animatable state of one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementStyle {
    /// px
    pub translate: DVec3,
    pub x_percent: f64,
    /// Degrees
    pub rotate_x: f64,
    pub rotate_y: f64,
    pub scale: f64,
    pub opacity: f64,
    /// px
    pub blur: f64,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            translate: DVec3::ZERO,
            x_percent: 0.0,
            rotate_x: 0.0,
            rotate_y: 0.0,
            scale: 1.0,
            opacity: 1.0,
            blur: 0.0,
        }
    }
}

impl ElementStyle {
    pub fn set(&mut self, property: PropertyName, value: f64) {
        match property {
            PropertyName::TranslateX => self.translate.x = value,
            PropertyName::TranslateY => self.translate.y = value,
            PropertyName::TranslateZ => self.translate.z = value,
            PropertyName::XPercent => self.x_percent = value,
            PropertyName::RotateX => self.rotate_x = value,
            PropertyName::RotateY => self.rotate_y = value,
            PropertyName::Scale => self.scale = value,
            PropertyName::Opacity => self.opacity = value.clamp(0.0, 1.0),
            PropertyName::Blur => self.blur = value.max(0.0),
        }
    }

    pub fn get(&self, property: PropertyName) -> f64 {
        match property {
            PropertyName::TranslateX => self.translate.x,
            PropertyName::TranslateY => self.translate.y,
            PropertyName::TranslateZ => self.translate.z,
            PropertyName::XPercent => self.x_percent,
            PropertyName::RotateX => self.rotate_x,
            PropertyName::RotateY => self.rotate_y,
            PropertyName::Scale => self.scale,
            PropertyName::Opacity => self.opacity,
            PropertyName::Blur => self.blur,
        }
    }

    /// CSS `transform` value (GSAP ordering: percent, translate, yaw, pitch, scale)
    pub fn transform_css(&self) -> String {
        let mut parts = Vec::new();
        if self.x_percent != 0.0 {
            parts.push(format!("translate({}%, 0%)", self.x_percent));
        }
        if self.translate != DVec3::ZERO {
            parts.push(format!(
                "translate3d({}px, {}px, {}px)",
                self.translate.x, self.translate.y, self.translate.z
            ));
        }
        if self.rotate_y != 0.0 {
            parts.push(format!("rotateY({}deg)", self.rotate_y));
        }
        if self.rotate_x != 0.0 {
            parts.push(format!("rotateX({}deg)", self.rotate_x));
        }
        if self.scale != 1.0 {
            parts.push(format!("scale({})", self.scale));
        }

        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }

    /// CSS `filter` value
    pub fn filter_css(&self) -> String {
        if self.blur > 0.0 {
            format!("blur({}px)", self.blur)
        } else {
            "none".to_string()
        }
    }

    pub fn opacity_css(&self) -> String {
        self.opacity.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_style_is_none() {
        let s = ElementStyle::default();
        assert_eq!(s.transform_css(), "none");
        assert_eq!(s.filter_css(), "none");
        assert_eq!(s.opacity_css(), "1");
    }

    #[test]
    fn test_transform_composition_order() {
        let mut s = ElementStyle::default();
        s.set(PropertyName::RotateX, 20.0);
        s.set(PropertyName::TranslateZ, 600.0);
        s.set(PropertyName::RotateY, 120.0);
        s.set(PropertyName::XPercent, -15.0);
        assert_eq!(
            s.transform_css(),
            "translate(-15%, 0%) translate3d(0px, 0px, 600px) rotateY(120deg) rotateX(20deg)"
        );
    }

    #[test]
    fn test_opacity_and_blur_clamped() {
        let mut s = ElementStyle::default();
        s.set(PropertyName::Opacity, 1.4);
        s.set(PropertyName::Blur, -3.0);
        assert_eq!(s.get(PropertyName::Opacity), 1.0);
        assert_eq!(s.filter_css(), "none");
        s.set(PropertyName::Blur, 20.0);
        assert_eq!(s.filter_css(), "blur(20px)");
    }
}
