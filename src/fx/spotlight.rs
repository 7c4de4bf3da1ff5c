//! Card spotlight: pointer position relative to each card
//!
//! The view turns these into `--mouse-x` / `--mouse-y` custom properties that
//! a radial-gradient highlight in the stylesheet follows.

use glam::DVec2;

use super::viewport::Rect;

/// Pointer-local coordinates for a set of cards
#[derive(Debug, Clone, Default)]
pub struct Spotlight {
    local: Vec<DVec2>,
}

impl Spotlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer in each card's own coordinate space (may lie outside the card)
    pub fn locate(pointer: DVec2, cards: &[Rect]) -> Vec<DVec2> {
        cards.iter().map(|card| pointer - card.origin()).collect()
    }

    /// Recompute for a new pointer position
    pub fn update(&mut self, pointer: DVec2, cards: &[Rect]) -> &[DVec2] {
        self.local = Self::locate(pointer, cards);
        &self.local
    }

    pub fn positions(&self) -> &[DVec2] {
        &self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_coordinates_per_card() {
        let cards = [
            Rect::new(0.0, 100.0, 300.0, 200.0),
            Rect::new(320.0, 100.0, 300.0, 200.0),
        ];
        let mut spot = Spotlight::new();
        let local = spot.update(DVec2::new(350.0, 150.0), &cards).to_vec();
        assert_eq!(local, vec![DVec2::new(350.0, 50.0), DVec2::new(30.0, 50.0)]);
        assert_eq!(spot.positions().len(), 2);
    }

    #[test]
    fn test_no_cards() {
        assert!(Spotlight::locate(DVec2::ZERO, &[]).is_empty());
    }
}
