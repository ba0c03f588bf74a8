use ash::vk;

/// 每个对象的 uniform 数组的编译期上限，N 在构造时校验不超过它
pub const MAX_OBJECTS: usize = 64;

/// 构造期的运行参数
#[derive(Clone, Debug)]
pub struct RendererSettings {
    pub window_extent: vk::Extent2D,
    /// 场景对象数 N，进程生命周期内固定
    pub object_cnt: u32,
    /// full render 的帧间隔，>= 1
    pub shading_interval: u32,
    /// shading 各 target 的固定边长，与窗口尺寸无关
    pub buffer_resolution: u32,
    /// 本次运行的数字标识，进入窗口标题和启动日志
    pub run_id: u32,
    pub clear_color: [f32; 4],
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            window_extent: vk::Extent2D { width: 1280, height: 720 },
            object_cnt: 16,
            shading_interval: 3,
            buffer_resolution: 2560,
            run_id: 0,
            clear_color: [0.121_568_63, 0.121_568_63, 0.121_568_63, 1.0],
        }
    }
}

impl RendererSettings {
    /// 校验参数；非法参数属于 setup failure，直接 panic
    pub fn validated(self) -> Self {
        assert!(self.object_cnt >= 1, "object_cnt must be at least 1");
        assert!(
            self.object_cnt as usize <= MAX_OBJECTS,
            "object_cnt {} exceeds MAX_OBJECTS {}",
            self.object_cnt,
            MAX_OBJECTS
        );
        assert!(self.shading_interval >= 1, "shading_interval must be at least 1");
        assert!(self.buffer_resolution >= 1, "buffer_resolution must be at least 1");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = RendererSettings::default().validated();
        assert_eq!(settings.shading_interval, 3);
        assert_eq!(settings.buffer_resolution, 2560);
    }

    #[test]
    #[should_panic(expected = "exceeds MAX_OBJECTS")]
    fn test_object_cnt_above_max_panics() {
        let _ = RendererSettings {
            object_cnt: MAX_OBJECTS as u32 + 1,
            ..Default::default()
        }
        .validated();
    }

    #[test]
    #[should_panic(expected = "shading_interval")]
    fn test_zero_interval_panics() {
        let _ = RendererSettings {
            shading_interval: 0,
            ..Default::default()
        }
        .validated();
    }
}
