// ============================================
// Frustum Culling - Отсечение узлов по view-projection
// ============================================
// Углы AABB переводятся в clip space. Внутри frustum:
//   0 <= z <= w  &&  -w <= x <= w
// Узел снаружи, если все 8 углов нарушают одну и ту же плоскость.
// Тест консервативный: пересечение плоскостей между собой не проверяется.

use ultraviolet::{Mat4, Vec3, Vec4};

use super::node::QuadTreeNode;

/// Результат проверки узла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullResult {
    /// Полностью вне frustum
    Outside,
    /// Полностью внутри: детей можно не проверять
    Inside,
    /// Частично: детей надо проверять
    Partial,
}

/// Классифицировать 8 углов AABB
pub fn classify_corners(corners: &[Vec3; 8], view_proj: &Mat4) -> CullResult {
    let projected = corners.map(|c| *view_proj * Vec4::new(c.x, c.y, c.z, 1.0));

    // Каждая плоскость проверяется отдельно
    let behind_near = projected.iter().filter(|p| p.z < 0.0).count();
    let beyond_right = projected.iter().filter(|p| p.x > p.w).count();
    let beyond_left = projected.iter().filter(|p| p.x < -p.w).count();
    let beyond_far = projected.iter().filter(|p| p.z > p.w).count();

    let failures = [behind_near, beyond_right, beyond_left, beyond_far];
    if failures.iter().any(|&count| count == corners.len()) {
        return CullResult::Outside;
    }

    if failures.iter().all(|&count| count == 0) {
        return CullResult::Inside;
    }

    CullResult::Partial
}

impl<G> QuadTreeNode<G> {
    /// Проверить узел против view-projection матрицы
    pub fn try_cull(&self, view_proj: &Mat4) -> CullResult {
        classify_corners(&self.corners, view_proj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::quadtree::node::{compute_corners, NodeRect};

    fn box_corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
        let rect = NodeRect { start_x: min.x, start_y: min.z, end_x: max.x, end_y: max.z };
        compute_corners(&rect, min.y, max.y)
    }

    #[test]
    fn test_identity_clip_space() {
        let vp = Mat4::identity();

        // С единичной матрицей clip = (x, y, z, 1)
        let inside = box_corners(Vec3::new(-0.5, -0.5, 0.1), Vec3::new(0.5, 0.5, 0.9));
        assert_eq!(classify_corners(&inside, &vp), CullResult::Inside);

        let behind = box_corners(Vec3::new(-0.5, 0.0, -3.0), Vec3::new(0.5, 1.0, -0.1));
        assert_eq!(classify_corners(&behind, &vp), CullResult::Outside);

        let right = box_corners(Vec3::new(1.5, 0.0, 0.2), Vec3::new(3.0, 1.0, 0.8));
        assert_eq!(classify_corners(&right, &vp), CullResult::Outside);

        let left = box_corners(Vec3::new(-3.0, 0.0, 0.2), Vec3::new(-1.5, 1.0, 0.8));
        assert_eq!(classify_corners(&left, &vp), CullResult::Outside);

        let far = box_corners(Vec3::new(-0.5, 0.0, 1.5), Vec3::new(0.5, 1.0, 2.0));
        assert_eq!(classify_corners(&far, &vp), CullResult::Outside);

        let straddling = box_corners(Vec3::new(0.5, 0.0, 0.2), Vec3::new(1.5, 1.0, 0.8));
        assert_eq!(classify_corners(&straddling, &vp), CullResult::Partial);
    }

    #[test]
    fn test_failures_on_different_planes_are_not_outside() {
        let vp = Mat4::identity();
        // Часть углов справа, часть позади - но ни одна плоскость не отсекает все 8
        let corners = [
            Vec3::new(2.0, 0.0, 0.5),
            Vec3::new(2.0, 0.0, 0.5),
            Vec3::new(2.0, 0.0, 0.5),
            Vec3::new(2.0, 0.0, 0.5),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];
        assert_eq!(classify_corners(&corners, &vp), CullResult::Partial);
    }

    #[test]
    fn test_view_target_is_never_outside() {
        let eye = Vec3::new(0.0, 40.0, -50.0);
        let target = Vec3::new(0.0, 0.0, 10.0);
        let view = Mat4::look_at(eye, target, Vec3::unit_y());
        let proj = ultraviolet::projection::perspective_wgpu_dx(60f32.to_radians(), 1.0, 0.1, 1000.0);
        let vp = proj * view;

        let around_target = box_corners(Vec3::new(-2.0, 0.0, 8.0), Vec3::new(2.0, 0.0, 12.0));
        assert_ne!(classify_corners(&around_target, &vp), CullResult::Outside);

        // То, что позади камеры, отсекается
        let behind_camera = box_corners(Vec3::new(-5.0, 0.0, -90.0), Vec3::new(5.0, 5.0, -80.0));
        assert_eq!(classify_corners(&behind_camera, &vp), CullResult::Outside);
    }
}
