/// 每帧由窗口层填好、按值传给渲染核心的输入快照。
/// 移动位是电平（按住持续生效），toggle 位是边沿（按下那一帧为 true）。
#[derive(Clone, Copy, Debug, Default)]
pub struct InputState {
    pub forwards: bool,
    pub backwards: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,

    /// 切换光源动画
    pub toggle_light_animation: bool,
    /// 触发一次材质重随机
    pub regenerate_materials: bool,
    /// 推进 reset 三态循环
    pub cycle_reset: bool,
}
