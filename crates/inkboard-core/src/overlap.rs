//! Overlap resolution between a placed object and the objects already on the canvas.

use crate::shapes::{CanvasObject, OverlapRule};

/// Whether the bounding boxes of two objects intersect. Touching edges count.
pub fn collides(a: &CanvasObject, b: &CanvasObject) -> bool {
    let a = a.bounds();
    let b = b.bounds();
    !(a.x1 < b.x0 || a.x0 > b.x1 || a.y1 < b.y0 || a.y0 > b.y1)
}

/// Push aside existing objects that collide with `incoming`.
///
/// A colliding object moves up by one grid cell when both it and `incoming`
/// use [`OverlapRule::Displace`]. This is a single pass: moved objects are not
/// re-checked, so residual overlaps are kept. `incoming` itself never moves and
/// an object never collides with itself.
pub fn resolve_overlap(
    incoming: &CanvasObject,
    existing: &[CanvasObject],
    grid_size: f64,
) -> Vec<CanvasObject> {
    if incoming.overlap_rule != OverlapRule::Displace {
        return existing.to_vec();
    }

    existing
        .iter()
        .map(|obj| {
            if obj.id == incoming.id
                || obj.overlap_rule != OverlapRule::Displace
                || !collides(incoming, obj)
            {
                return obj.clone();
            }
            let mut displaced = obj.clone();
            displaced.position.y -= grid_size;
            displaced.touch();
            log::debug!("Displaced object {} to y={}", displaced.id, displaced.position.y);
            displaced
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasConfig;
    use crate::shapes::{ObjectOverrides, ObjectType, create_object};
    use kurbo::{Point, Size};

    fn object(x: f64, y: f64, rule: OverlapRule) -> CanvasObject {
        create_object(
            ObjectType::Shape,
            Point::new(x, y),
            Size::new(100.0, 100.0),
            &CanvasConfig::default(),
            ObjectOverrides::new().overlap_rule(rule),
        )
    }

    #[test]
    fn test_collides() {
        let a = object(100.0, 100.0, OverlapRule::Displace);
        assert!(collides(&a, &object(150.0, 150.0, OverlapRule::Displace)));
        // Shared edge
        assert!(collides(&a, &object(200.0, 100.0, OverlapRule::Displace)));
        assert!(!collides(&a, &object(220.0, 100.0, OverlapRule::Displace)));
        assert!(!collides(&a, &object(100.0, 220.0, OverlapRule::Displace)));
    }

    #[test]
    fn test_identical_boxes_displace_up_one_cell() {
        let existing = object(200.0, 200.0, OverlapRule::Displace);
        let incoming = object(200.0, 200.0, OverlapRule::Displace);
        let result = resolve_overlap(&incoming, std::slice::from_ref(&existing), 20.0);
        assert_eq!(result[0].position, Point::new(200.0, 180.0));
        assert!(result[0].last_modified > existing.last_modified);
    }

    #[test]
    fn test_allow_on_either_side_keeps_positions() {
        let existing = object(200.0, 200.0, OverlapRule::Allow);
        let incoming = object(200.0, 200.0, OverlapRule::Displace);
        let result = resolve_overlap(&incoming, std::slice::from_ref(&existing), 20.0);
        assert_eq!(result[0], existing);

        let existing = object(200.0, 200.0, OverlapRule::Displace);
        let incoming = object(200.0, 200.0, OverlapRule::Allow);
        let result = resolve_overlap(&incoming, std::slice::from_ref(&existing), 20.0);
        assert_eq!(result[0], existing);
    }

    #[test]
    fn test_object_never_collides_with_itself() {
        let obj = object(200.0, 200.0, OverlapRule::Displace);
        let result = resolve_overlap(&obj, std::slice::from_ref(&obj), 20.0);
        assert_eq!(result[0], obj);
    }

    #[test]
    fn test_single_pass_keeps_residual_overlap() {
        let incoming = object(200.0, 200.0, OverlapRule::Displace);
        let a = object(200.0, 220.0, OverlapRule::Displace);
        let b = object(200.0, 200.0, OverlapRule::Displace);
        let far = object(800.0, 800.0, OverlapRule::Displace);
        let result = resolve_overlap(&incoming, &[a.clone(), b.clone(), far.clone()], 20.0);

        assert_eq!(result[0].position.y, 200.0);
        assert_eq!(result[1].position.y, 180.0);
        assert_eq!(result[2], far);
        // a and b still overlap each other and the incoming object.
        assert!(collides(&result[0], &result[1]));
        assert_eq!(incoming.position, Point::new(200.0, 200.0));
    }
}
