use glam::Vec3;
use rand::Rng;

/// 每帧发布给渲染核心的单个对象状态，orientation 单位为角度
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ObjectPose {
    pub position: Vec3,
    /// (x, y, z) 各轴旋转角，degrees
    pub orientation: Vec3,
}

/// N 体风格的简单积分器
///
/// 每个对象带随机线速度和角速度；超出球形边界时速度被反射回内侧，
/// 包围球重叠时相互推开。
pub struct PhysicsSim {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    orientations: Vec<Vec3>,
    rotations: Vec<Vec3>,
    /// 包围球直径，对象间最小间距
    bounds: f32,
}

// new & init
impl PhysicsSim {
    pub fn new(n_objects: usize, rng: &mut impl Rng) -> Self {
        let mut sim = Self {
            positions: vec![Vec3::ZERO; n_objects],
            velocities: vec![Vec3::ZERO; n_objects],
            orientations: vec![Vec3::ZERO; n_objects],
            rotations: vec![Vec3::ZERO; n_objects],
            bounds: 2.0,
        };
        sim.reseed(rng);
        sim
    }

    /// 重新随机化速度并清零姿态，位置保持不变（rearrange 之后调用）
    pub fn reseed(&mut self, rng: &mut impl Rng) {
        for i in 0..self.positions.len() {
            self.velocities[i] = Vec3::new(
                rng.gen_range(-0.01..0.01),
                rng.gen_range(-0.01..0.01),
                rng.gen_range(-0.01..0.01),
            );
            self.rotations[i] = Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            self.orientations[i] = Vec3::ZERO;
        }
    }

    /// 覆盖对象位置（静态排列写入）
    pub fn set_positions(&mut self, positions: &[Vec3]) {
        assert_eq!(positions.len(), self.positions.len());
        self.positions.copy_from_slice(positions);
    }
}

// update
impl PhysicsSim {
    /// 推进一个时间步，delta 单位为秒
    pub fn step(&mut self, delta: f32) {
        let n = self.positions.len();

        // advance the simulation
        for i in 0..n {
            self.positions[i] += self.velocities[i] * delta * 0.05;
            self.orientations[i] += self.rotations[i] * delta * 0.005;
        }

        // collide with boundary
        for i in 0..n {
            if self.positions[i].length() > 12.0 {
                self.velocities[i] = self.positions[i].normalize() * -0.01;
            }
        }

        // collide with each other
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let separation = self.positions[i] - self.positions[j];
                if separation.length() < self.bounds {
                    self.velocities[i] = separation.normalize() * 0.01;
                    self.velocities[j] = separation.normalize() * -0.01;
                }
            }
        }
    }
}

// getters
impl PhysicsSim {
    #[inline]
    pub fn object_cnt(&self) -> usize {
        self.positions.len()
    }

    pub fn poses(&self) -> Vec<ObjectPose> {
        self.positions
            .iter()
            .zip(self.orientations.iter())
            .map(|(&position, &orientation)| ObjectPose { position, orientation })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_new_sim_sizes() {
        let mut rng = StdRng::seed_from_u64(7);
        let sim = PhysicsSim::new(16, &mut rng);
        assert_eq!(sim.object_cnt(), 16);
        assert_eq!(sim.poses().len(), 16);
        // 初始姿态为零
        assert!(sim.poses().iter().all(|p| p.orientation == Vec3::ZERO));
    }

    #[test]
    fn test_step_advances_orientation() {
        let mut rng = StdRng::seed_from_u64(7);
        // 单个对象不会触发碰撞分支
        let mut sim = PhysicsSim::new(1, &mut rng);
        sim.step(1.0);
        let pose = sim.poses()[0];
        assert!(pose.orientation != Vec3::ZERO);
    }

    #[test]
    fn test_boundary_reflects_velocity_inward() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sim = PhysicsSim::new(1, &mut rng);
        sim.set_positions(&[Vec3::new(20.0, 0.0, 0.0)]);
        sim.step(0.016);
        // 反射后速度指向原点
        assert!(sim.velocities[0].x < 0.0);
        assert!((sim.velocities[0].length() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_objects_separate() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sim = PhysicsSim::new(2, &mut rng);
        sim.set_positions(&[Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)]);
        sim.step(0.016);
        // 两个对象被推向相反方向
        assert!(sim.velocities[0].x < 0.0);
        assert!(sim.velocities[1].x > 0.0);
    }
}
