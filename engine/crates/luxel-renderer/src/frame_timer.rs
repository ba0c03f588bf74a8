use std::time::Instant;

/// 帧计数与时间状态
///
/// - `frame` 从 1 开始单调递增，cadence 的判定基于它
/// - `timer` 是动画时钟，只有 `advance` 才推进，rearrange 时清零
pub struct FrameTimer {
    frame: u64,
    delta: f32,
    timer: f32,
    last_tick: Option<Instant>,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

// new & init
impl FrameTimer {
    pub fn new() -> Self {
        Self {
            frame: 0,
            delta: 0.0,
            timer: 0.0,
            last_tick: None,
        }
    }
}

// update
impl FrameTimer {
    /// 每帧开头调用一次：计算 delta 并推进帧号
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = match self.last_tick {
            Some(last) => now.duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);
        self.frame += 1;
    }

    /// 推进动画时钟（光源动画开启时才调用）
    #[inline]
    pub fn advance(&mut self) {
        self.timer += self.delta;
    }

    /// rearrange 时动画时钟归零
    #[inline]
    pub fn reset_timer(&mut self) {
        self.timer = 0.0;
    }
}

// getters
impl FrameTimer {
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }
    #[inline]
    pub fn timer(&self) -> f32 {
        self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_increments_frame() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.frame(), 0);
        timer.update();
        assert_eq!(timer.frame(), 1);
        timer.update();
        assert_eq!(timer.frame(), 2);
    }

    #[test]
    fn test_delta_covers_latest_interval() {
        // update 后 delta 是刚结束的一段时长，物理积分在同一帧内消费它
        let mut timer = FrameTimer::new();
        timer.update();
        assert_eq!(timer.delta(), 0.0);
        std::thread::sleep(std::time::Duration::from_millis(20));
        timer.update();
        assert!(timer.delta() >= 0.015, "stale delta: {}", timer.delta());
    }

    #[test]
    fn test_timer_only_advances_explicitly() {
        let mut timer = FrameTimer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.timer(), 0.0);
        timer.advance();
        // delta 可能为 0 但不为负
        assert!(timer.timer() >= 0.0);
        timer.reset_timer();
        assert_eq!(timer.timer(), 0.0);
    }
}
