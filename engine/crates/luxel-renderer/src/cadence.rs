//! 帧节奏调度：决定每个呈现帧是 full render 还是 half render，
//! 并把一帧要做的提交与同步关系展开为纯数据的 `FramePlan`。
//!
//! plan 与执行分离，调度协议本身不持有任何 GPU 对象，可以直接测试。

/// 一帧的渲染路径
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPath {
    /// shading group + raster group
    FullRender,
    /// 复用上一次 lighting 结果，只跑 raster group
    HalfRender,
}

/// 同步 token，对应 sync chain 中的 binary semaphore
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPoint {
    /// swapchain image 可写
    SurfaceAcquired,
    /// shading group 执行完毕
    ShadingComplete,
    /// raster group 执行完毕，可以 present
    RenderComplete,
}

/// 一帧内按顺序 enqueue 的节点
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitNode {
    /// 提交 shading group：不等待任何 token（不触碰 swapchain image）
    Shading { signals: Vec<SyncPoint> },
    /// 获取下一个 swapchain image
    AcquireSurface { signals: Vec<SyncPoint> },
    /// 提交 raster group
    Raster {
        waits: Vec<SyncPoint>,
        signals: Vec<SyncPoint>,
    },
    /// 请求呈现
    Present { waits: Vec<SyncPoint> },
}

/// 一帧的完整提交计划
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
    pub path: RenderPath,
    pub nodes: Vec<SubmitNode>,
}

impl FramePlan {
    pub fn contains_shading(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, SubmitNode::Shading { .. }))
    }
}

/// 帧节奏调度器
#[derive(Clone, Copy, Debug)]
pub struct FrameCadence {
    interval: u64,
}

impl FrameCadence {
    pub fn new(interval: u32) -> Self {
        assert!(interval >= 1, "cadence interval must be at least 1");
        Self { interval: interval as u64 }
    }

    /// `(frame - 1) mod interval == 0` 选 full render，frame 从 1 开始
    #[inline]
    pub fn decide(&self, frame: u64) -> RenderPath {
        debug_assert!(frame >= 1);
        if (frame - 1) % self.interval == 0 {
            RenderPath::FullRender
        } else {
            RenderPath::HalfRender
        }
    }

    pub fn plan(&self, frame: u64) -> FramePlan {
        let path = self.decide(frame);
        let nodes = match path {
            RenderPath::FullRender => vec![
                SubmitNode::Shading {
                    signals: vec![SyncPoint::ShadingComplete],
                },
                SubmitNode::AcquireSurface {
                    signals: vec![SyncPoint::SurfaceAcquired],
                },
                SubmitNode::Raster {
                    waits: vec![SyncPoint::ShadingComplete, SyncPoint::SurfaceAcquired],
                    signals: vec![SyncPoint::RenderComplete],
                },
                SubmitNode::Present {
                    waits: vec![SyncPoint::RenderComplete],
                },
            ],
            RenderPath::HalfRender => vec![
                SubmitNode::AcquireSurface {
                    signals: vec![SyncPoint::SurfaceAcquired],
                },
                SubmitNode::Raster {
                    waits: vec![SyncPoint::SurfaceAcquired],
                    signals: vec![SyncPoint::RenderComplete],
                },
                SubmitNode::Present {
                    waits: vec![SyncPoint::RenderComplete],
                },
            ],
        };
        FramePlan { path, nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plans(interval: u32, frames: u64) -> Vec<FramePlan> {
        let cadence = FrameCadence::new(interval);
        (1..=frames).map(|f| cadence.plan(f)).collect()
    }

    #[test]
    fn test_interval_3_selects_frames_1_4_7() {
        let cadence = FrameCadence::new(3);
        let full: Vec<u64> = (1..=9).filter(|&f| cadence.decide(f) == RenderPath::FullRender).collect();
        assert_eq!(full, vec![1, 4, 7]);
        let half: Vec<u64> = (1..=9).filter(|&f| cadence.decide(f) == RenderPath::HalfRender).collect();
        assert_eq!(half, vec![2, 3, 5, 6, 8, 9]);
    }

    #[test]
    fn test_interval_1_is_always_full() {
        let plans = plans(1, 10);
        assert_eq!(plans.iter().filter(|p| p.path == RenderPath::FullRender).count(), 10);
        assert_eq!(plans.iter().filter(|p| p.path == RenderPath::HalfRender).count(), 0);
        // 每帧都 present，且 present 之前有一次 shading 提交
        for plan in &plans {
            assert!(plan.contains_shading());
            let shading_idx = plan.nodes.iter().position(|n| matches!(n, SubmitNode::Shading { .. })).unwrap();
            let present_idx = plan.nodes.iter().position(|n| matches!(n, SubmitNode::Present { .. })).unwrap();
            assert!(shading_idx < present_idx);
        }
    }

    #[test]
    fn test_interval_4_writes_lighting_twice_in_8_frames() {
        let plans = plans(4, 8);
        let full: Vec<usize> =
            plans.iter().enumerate().filter(|(_, p)| p.path == RenderPath::FullRender).map(|(i, _)| i + 1).collect();
        assert_eq!(full, vec![1, 5]);
        // lighting target 恰好被写两次
        assert_eq!(plans.iter().filter(|p| p.contains_shading()).count(), 2);
    }

    #[test]
    fn test_half_plan_has_no_shading_submission() {
        let cadence = FrameCadence::new(3);
        for frame in [2u64, 3, 5, 6] {
            let plan = cadence.plan(frame);
            assert_eq!(plan.path, RenderPath::HalfRender);
            assert!(!plan.contains_shading());
        }
    }

    #[test]
    fn test_full_plan_raster_waits_on_both_tokens() {
        let plan = FrameCadence::new(2).plan(1);
        let raster_waits = plan
            .nodes
            .iter()
            .find_map(|n| match n {
                SubmitNode::Raster { waits, .. } => Some(waits.clone()),
                _ => None,
            })
            .unwrap();
        assert!(raster_waits.contains(&SyncPoint::ShadingComplete));
        assert!(raster_waits.contains(&SyncPoint::SurfaceAcquired));
    }

    #[test]
    fn test_half_plan_raster_waits_only_surface() {
        let plan = FrameCadence::new(2).plan(2);
        let raster_waits = plan
            .nodes
            .iter()
            .find_map(|n| match n {
                SubmitNode::Raster { waits, .. } => Some(waits.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(raster_waits, vec![SyncPoint::SurfaceAcquired]);
    }

    #[test]
    fn test_surface_consumers_follow_acquire() {
        // acquire 失败丢帧时，之后的节点必须全部依赖 surface，
        // 即 raster 与 present 只会排在 acquire 之后
        for interval in [1u32, 3] {
            for plan in plans(interval, 8) {
                let acquire_idx =
                    plan.nodes.iter().position(|n| matches!(n, SubmitNode::AcquireSurface { .. })).unwrap();
                for (idx, node) in plan.nodes.iter().enumerate() {
                    if matches!(node, SubmitNode::Raster { .. } | SubmitNode::Present { .. }) {
                        assert!(idx > acquire_idx, "{:?} scheduled before acquire", node);
                    }
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "interval")]
    fn test_zero_interval_panics() {
        let _ = FrameCadence::new(0);
    }
}
