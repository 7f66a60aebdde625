//! Touchpad swipe recognition

use log::trace;

use super::Direction;
use crate::event::Point;

#[derive(Debug, Clone, Copy)]
struct Swipe {
    fingers: u32,
    delta: Point,
}

/// Tracks one swipe from begin to end
#[derive(Debug, Default)]
pub struct SwipeRecognizer {
    active: Option<Swipe>,
}

impl SwipeRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.active.is_some()
    }

    /// Start tracking; an unfinished swipe is discarded
    pub fn begin(&mut self, fingers: u32) {
        self.active = Some(Swipe {
            fingers,
            delta: Point::default(),
        });
    }

    pub fn update(&mut self, delta: Point) {
        if let Some(swipe) = self.active.as_mut() {
            swipe.delta = swipe.delta + delta;
        }
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Finish the swipe, returning finger count and dominant direction
    pub fn end(&mut self) -> Option<(u32, Direction)> {
        let swipe = self.active.take()?;
        let direction = dominant_direction(swipe.delta)?;
        trace!("swipe ended: {} fingers {:?}", swipe.fingers, direction);
        Some((swipe.fingers, direction))
    }
}

fn dominant_direction(delta: Point) -> Option<Direction> {
    if delta.x == 0.0 && delta.y == 0.0 {
        return None;
    }
    let direction = if delta.x.abs() > delta.y.abs() {
        if delta.x < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    } else if delta.y < 0.0 {
        Direction::Up
    } else {
        Direction::Down
    };
    Some(direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_axis_wins() {
        let mut swipe = SwipeRecognizer::new();
        swipe.begin(3);
        swipe.update(Point::new(-5.0, 2.0));
        swipe.update(Point::new(-10.0, -4.0));
        assert_eq!(swipe.end(), Some((3, Direction::Left)));
        assert!(!swipe.is_tracking());

        swipe.begin(4);
        swipe.update(Point::new(1.0, 30.0));
        assert_eq!(swipe.end(), Some((4, Direction::Down)));
    }

    #[test]
    fn test_no_movement_no_direction() {
        let mut swipe = SwipeRecognizer::new();
        swipe.begin(3);
        assert_eq!(swipe.end(), None);
        // updates without a begin are ignored
        swipe.update(Point::new(10.0, 0.0));
        assert_eq!(swipe.end(), None);
    }

    #[test]
    fn test_begin_restarts() {
        let mut swipe = SwipeRecognizer::new();
        swipe.begin(3);
        swipe.update(Point::new(50.0, 0.0));
        swipe.begin(4);
        swipe.update(Point::new(0.0, -2.0));
        assert_eq!(swipe.end(), Some((4, Direction::Up)));
    }
}
