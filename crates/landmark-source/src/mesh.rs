//! Eye extraction from a 468-point face mesh (MediaPipe topology)

use crate::{FaceLandmarks, LandmarkError, Point2D};

/// Minimum mesh size (478 with iris refinement is accepted too)
pub const MESH_POINTS: usize = 468;

/// Left eye, in EAR order: outer, upper 1, upper 2, inner, lower 2, lower 1
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Right eye. Corners are mirrored relative to the left eye; EAR only uses
/// their distance so the order does not matter there.
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Pick both eyes out of a full face mesh
pub fn face_from_mesh(mesh: &[Point2D]) -> Result<FaceLandmarks, LandmarkError> {
    if mesh.len() < MESH_POINTS {
        return Err(LandmarkError::MeshTooShort {
            expected: MESH_POINTS,
            actual: mesh.len(),
        });
    }

    let pick = |indices: &[usize; 6]| indices.iter().map(|&i| mesh[i]).collect();
    Ok(FaceLandmarks::new(pick(&LEFT_EYE), pick(&RIGHT_EYE)))
}
