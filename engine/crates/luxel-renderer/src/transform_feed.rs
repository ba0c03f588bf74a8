//! 把物理 pose 转为 shader 需要的 model 矩阵，以及场景摆放辅助。

use glam::{Mat4, Vec3};

/// pose -> model 矩阵，固定顺序：
/// `T(position) * S(0.5) * Rz(180) * Rz(oz) * Ry(oy) * Rx(ox)`
///
/// orientation 以角度为单位，先天翻转 180 度保证初始朝向正确。
pub fn model_matrix(position: Vec3, orientation_deg: Vec3) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_scale(Vec3::splat(0.5))
        * Mat4::from_rotation_z(180.0_f32.to_radians())
        * Mat4::from_rotation_z(orientation_deg.z.to_radians())
        * Mat4::from_rotation_y(orientation_deg.y.to_radians())
        * Mat4::from_rotation_x(orientation_deg.x.to_radians())
}

/// 在 XZ 平面上排出 m 列网格（m = floor(sqrt(n))），
/// 间距 2.5，再减去质心让整体围绕原点。
pub fn grid_arrangement(object_cnt: usize) -> Vec<Vec3> {
    const OFFSET: f32 = 2.5;

    let m = (f64::sqrt(object_cnt as f64).floor() as usize).max(1);
    let positions: Vec<Vec3> = (0..object_cnt)
        .map(|id| Vec3::new((id % m) as f32, 0.0, (id / m) as f32) * OFFSET)
        .collect();

    let centroid = positions.iter().copied().sum::<Vec3>() / object_cnt.max(1) as f32;
    positions.into_iter().map(|p| p - centroid).collect()
}

/// reset 键的三态循环：每按一次前进一格
///
/// - `Idle`：物理暂停
/// - `PhysicsResume`：每帧推进物理模拟
/// - `Rearrange`：下一帧重新摆放并重置计时，然后回到 `Idle`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResetTrigger {
    #[default]
    Idle,
    PhysicsResume,
    Rearrange,
}

impl ResetTrigger {
    pub fn advance(self) -> Self {
        match self {
            ResetTrigger::Idle => ResetTrigger::PhysicsResume,
            ResetTrigger::PhysicsResume => ResetTrigger::Rearrange,
            ResetTrigger::Rearrange => ResetTrigger::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_orientation_model_matrix() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let m = model_matrix(position, Vec3::ZERO);
        let expected = Mat4::from_translation(position)
            * Mat4::from_scale(Vec3::splat(0.5))
            * Mat4::from_rotation_z(std::f32::consts::PI);
        assert!(m.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_orientation_applies_zyx_order() {
        let o = Vec3::new(30.0, 45.0, 60.0);
        let m = model_matrix(Vec3::ZERO, o);
        let expected = Mat4::from_scale(Vec3::splat(0.5))
            * Mat4::from_rotation_z(std::f32::consts::PI)
            * Mat4::from_rotation_z(o.z.to_radians())
            * Mat4::from_rotation_y(o.y.to_radians())
            * Mat4::from_rotation_x(o.x.to_radians());
        assert!(m.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_grid_uses_floor_sqrt_columns() {
        // n = 10 -> m = 3，列坐标只出现 3 种
        let positions = grid_arrangement(10);
        assert_eq!(positions.len(), 10);
        let mut xs: Vec<i32> = positions.iter().map(|p| (p.x * 10.0).round() as i32).collect();
        xs.sort_unstable();
        xs.dedup();
        assert_eq!(xs.len(), 3);
    }

    #[test]
    fn test_grid_is_recentred() {
        let positions = grid_arrangement(16);
        let sum = positions.iter().copied().sum::<Vec3>();
        assert!(sum.length() < 1e-4);
    }

    #[test]
    fn test_reset_cycle_returns_to_idle() {
        let mut trigger = ResetTrigger::default();
        assert_eq!(trigger, ResetTrigger::Idle);
        trigger = trigger.advance();
        assert_eq!(trigger, ResetTrigger::PhysicsResume);
        trigger = trigger.advance();
        assert_eq!(trigger, ResetTrigger::Rearrange);
        trigger = trigger.advance();
        assert_eq!(trigger, ResetTrigger::Idle);
    }
}
