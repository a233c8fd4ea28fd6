//! Drag/resize gesture state machine.
//!
//! `Idle -> Dragging -> Idle` and `Idle -> Resizing -> Idle`, mutually
//! exclusive. Geometry is committed to the store on every pointer move,
//! not on release, so the visual and stored states never diverge and an
//! interrupted gesture leaves the field at its last clamped position.
//! `is_active` tells the host exactly when document-wide move listeners
//! must be attached; they come off again on the transition back to Idle.
//!
//! Dragging tracks the grab offset between pointer and field origin and
//! repositions absolutely, so a field clamped at a page edge snaps back
//! under the pointer the moment it returns. Resizing applies incremental
//! deltas from the last pointer position.

use crate::field::FieldId;
use crate::geometry::{Scale, ScreenPoint, ScreenVec};
use crate::store::FieldStore;
use pdf_engine::PageSize;

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    Dragging {
        page: u16,
        id: FieldId,
        /// Pointer position minus field top-left, in screen pixels,
        /// captured at pointer-down.
        grab_offset: ScreenVec,
    },
    Resizing {
        page: u16,
        id: FieldId,
        last: ScreenPoint,
    },
}

#[derive(Debug)]
pub struct FieldGesture {
    state: GestureState,
}

impl Default for FieldGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldGesture {
    pub fn new() -> Self {
        Self { state: GestureState::Idle }
    }

    pub fn is_active(&self) -> bool {
        self.state != GestureState::Idle
    }

    /// Pointer-down on a field body: Idle -> Dragging. Ignored while
    /// another gesture is active.
    pub fn pointer_down_on_body(
        &mut self,
        store: &FieldStore,
        scale: Scale,
        page: u16,
        id: FieldId,
        at: ScreenPoint,
    ) -> bool {
        if self.is_active() {
            log::debug!("pointer down ignored, gesture already active");
            return false;
        }
        let Some(field) = store.get(page, id) else {
            return false;
        };
        let origin = field.rect.top_left().to_screen(scale);
        self.state = GestureState::Dragging {
            page,
            id,
            grab_offset: ScreenVec::between(origin, at),
        };
        true
    }

    /// Pointer-down on the resize handle: Idle -> Resizing.
    pub fn pointer_down_on_handle(
        &mut self,
        store: &FieldStore,
        page: u16,
        id: FieldId,
        at: ScreenPoint,
    ) -> bool {
        if self.is_active() {
            log::debug!("pointer down ignored, gesture already active");
            return false;
        }
        if store.get(page, id).is_none() {
            return false;
        }
        self.state = GestureState::Resizing { page, id, last: at };
        true
    }

    /// Pointer move while a gesture is active: convert through the current
    /// scale and commit the clamped geometry immediately. A move in Idle
    /// is a no-op.
    pub fn pointer_move(
        &mut self,
        store: &mut FieldStore,
        bounds: PageSize,
        scale: Scale,
        at: ScreenPoint,
    ) {
        match self.state {
            GestureState::Idle => {}
            GestureState::Dragging { page, id, grab_offset } => {
                let top_left = ScreenPoint::new(at.x - grab_offset.dx, at.y - grab_offset.dy)
                    .to_page(scale);
                store.move_field(page, id, top_left, bounds);
            }
            GestureState::Resizing { page, id, last } => {
                let delta = ScreenVec::between(last, at).to_page(scale);
                if let Some(field) = store.get(page, id) {
                    let width = field.rect.width + delta.dx;
                    let height = field.rect.height + delta.dy;
                    store.resize_field(page, id, width, height, bounds);
                }
                self.state = GestureState::Resizing { page, id, last: at };
            }
        }
    }

    /// Pointer released: back to Idle. Nothing left to commit.
    pub fn pointer_up(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Gesture aborted (pointer left the window, focus lost). The last
    /// committed geometry stands.
    pub fn cancel(&mut self) {
        if self.is_active() {
            log::debug!("gesture cancelled");
        }
        self.state = GestureState::Idle;
    }

    /// Page the active gesture is operating on, if any.
    pub fn active_page(&self) -> Option<u16> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Dragging { page, .. } | GestureState::Resizing { page, .. } => Some(page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::geometry::PagePoint;

    fn bounds() -> PageSize {
        PageSize::new(600.0, 800.0)
    }

    fn store_with_field() -> (FieldStore, FieldId) {
        let mut store = FieldStore::new();
        let id = store.create(1, FieldKind::Text, PagePoint::new(50.0, 50.0), bounds());
        (store, id)
    }

    #[test]
    fn drag_commits_on_every_move() {
        let (mut store, id) = store_with_field();
        let scale = Scale::new(2.0);
        let mut gesture = FieldGesture::new();

        // Grab the field 10px inside its origin (100px, 100px on screen).
        assert!(gesture.pointer_down_on_body(&store, scale, 1, id, ScreenPoint::new(110.0, 110.0)));
        assert!(gesture.is_active());

        gesture.pointer_move(&mut store, bounds(), scale, ScreenPoint::new(130.0, 150.0));
        let rect = store.get(1, id).unwrap().rect;
        // 20px / scale 2 = 10pt right, 40px / 2 = 20pt down.
        assert_eq!(rect.left, 60.0);
        assert_eq!(rect.top, 70.0);

        gesture.pointer_move(&mut store, bounds(), scale, ScreenPoint::new(110.0, 110.0));
        let rect = store.get(1, id).unwrap().rect;
        assert_eq!(rect.left, 50.0);
        assert_eq!(rect.top, 50.0);

        gesture.pointer_up();
        assert!(!gesture.is_active());
    }

    #[test]
    fn drag_clamps_at_edges_and_recovers() {
        let (mut store, id) = store_with_field();
        let scale = Scale::new(1.0);
        let mut gesture = FieldGesture::new();
        gesture.pointer_down_on_body(&store, scale, 1, id, ScreenPoint::new(50.0, 50.0));

        // Way off the right edge: clamped to page_width - width.
        gesture.pointer_move(&mut store, bounds(), scale, ScreenPoint::new(5000.0, 50.0));
        assert_eq!(store.get(1, id).unwrap().rect.left, 500.0);

        // Pointer returns; absolute repositioning puts the field back
        // under the grab point instead of drifting.
        gesture.pointer_move(&mut store, bounds(), scale, ScreenPoint::new(200.0, 50.0));
        assert_eq!(store.get(1, id).unwrap().rect.left, 200.0);
    }

    #[test]
    fn resize_applies_scaled_deltas_and_clamps() {
        // Field at (50, 50) sized 100x30 on a 600x800 page, scale 1.5.
        let (mut store, id) = store_with_field();
        let scale = Scale::new(1.5);
        let mut gesture = FieldGesture::new();
        gesture.pointer_down_on_handle(&store, 1, id, ScreenPoint::new(225.0, 120.0));

        // Screen delta (600, 0) -> 400pt: width 100 + 400 = 500, under the
        // 550pt clamp bound (600 - 50).
        gesture.pointer_move(&mut store, bounds(), scale, ScreenPoint::new(825.0, 120.0));
        assert_eq!(store.get(1, id).unwrap().rect.width, 500.0);

        // Keep dragging past the page edge: clamped at 550, never beyond.
        gesture.pointer_move(&mut store, bounds(), scale, ScreenPoint::new(2000.0, 120.0));
        assert_eq!(store.get(1, id).unwrap().rect.width, 550.0);
        assert!(store.get(1, id).unwrap().rect.fits_within(bounds()));
    }

    #[test]
    fn gestures_are_mutually_exclusive() {
        let (store, id) = store_with_field();
        let mut gesture = FieldGesture::new();

        assert!(gesture.pointer_down_on_body(
            &store,
            Scale::new(1.0),
            1,
            id,
            ScreenPoint::new(50.0, 50.0)
        ));
        assert!(!gesture.pointer_down_on_handle(&store, 1, id, ScreenPoint::new(150.0, 80.0)));
        assert_eq!(gesture.active_page(), Some(1));
    }

    #[test]
    fn cancel_keeps_last_committed_geometry() {
        let (mut store, id) = store_with_field();
        let scale = Scale::new(1.0);
        let mut gesture = FieldGesture::new();
        gesture.pointer_down_on_body(&store, scale, 1, id, ScreenPoint::new(50.0, 50.0));
        gesture.pointer_move(&mut store, bounds(), scale, ScreenPoint::new(80.0, 90.0));

        gesture.cancel();
        assert!(!gesture.is_active());
        let rect = store.get(1, id).unwrap().rect;
        assert_eq!(rect.left, 80.0);
        assert_eq!(rect.top, 90.0);
    }

    #[test]
    fn move_in_idle_is_a_no_op() {
        let (mut store, id) = store_with_field();
        let before = store.get(1, id).unwrap().rect;

        let mut gesture = FieldGesture::new();
        gesture.pointer_move(&mut store, bounds(), Scale::new(1.0), ScreenPoint::new(9.0, 9.0));
        assert_eq!(store.get(1, id).unwrap().rect, before);
    }

    #[test]
    fn pointer_down_on_missing_field_stays_idle() {
        let (store, _) = store_with_field();
        let mut gesture = FieldGesture::new();
        assert!(!gesture.pointer_down_on_body(
            &store,
            Scale::new(1.0),
            1,
            FieldId::new_v4(),
            ScreenPoint::new(0.0, 0.0)
        ));
        assert!(!gesture.is_active());
    }
}
