use ash::vk;

/// render target 的访问状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetLayout {
    /// 初始状态，内容未定义
    Undefined,
    /// 可作为 color attachment 写入
    WriteOptimal,
    /// 可在 fragment shader 中采样
    ReadOptimal,
}

impl TargetLayout {
    #[inline]
    pub fn vk_layout(self) -> vk::ImageLayout {
        match self {
            TargetLayout::Undefined => vk::ImageLayout::UNDEFINED,
            TargetLayout::WriteOptimal => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            TargetLayout::ReadOptimal => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }
}

/// 声明表之外的状态转换，pass graph 写错时才会出现
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnrecognizedTransition {
    pub from: TargetLayout,
    pub to: TargetLayout,
}

impl std::fmt::Display for UnrecognizedTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized transition: {:?} -> {:?}", self.from, self.to)
    }
}
impl std::error::Error for UnrecognizedTransition {}

/// 一条转换边对应的 barrier 同步范围
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionMasks {
    pub src_stage: vk::PipelineStageFlags2,
    pub src_access: vk::AccessFlags2,
    pub dst_stage: vk::PipelineStageFlags2,
    pub dst_access: vk::AccessFlags2,
}

impl TransitionMasks {
    /// 显式的 (old, new) -> 同步范围 转换表，只有三条声明边。
    ///
    /// - `Ok(None)`：同态转换，no-op 快速路径
    /// - `Ok(Some(masks))`：合法边，记录 barrier
    /// - `Err`：表外转换，状态保持不变
    pub fn lookup(from: TargetLayout, to: TargetLayout) -> Result<Option<TransitionMasks>, UnrecognizedTransition> {
        if from == to {
            return Ok(None);
        }
        match (from, to) {
            // 首次使用，没有需要等待的先行访问
            (TargetLayout::Undefined, TargetLayout::WriteOptimal) => Ok(Some(TransitionMasks {
                src_stage: vk::PipelineStageFlags2::TOP_OF_PIPE,
                src_access: vk::AccessFlags2::empty(),
                dst_stage: vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                dst_access: vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
            })),
            // 写完之后给后续 stage 采样
            (TargetLayout::WriteOptimal, TargetLayout::ReadOptimal) => Ok(Some(TransitionMasks {
                src_stage: vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                src_access: vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                dst_stage: vk::PipelineStageFlags2::FRAGMENT_SHADER,
                dst_access: vk::AccessFlags2::SHADER_READ,
            })),
            // 被采样过之后重新作为写目标
            (TargetLayout::ReadOptimal, TargetLayout::WriteOptimal) => Ok(Some(TransitionMasks {
                src_stage: vk::PipelineStageFlags2::FRAGMENT_SHADER,
                src_access: vk::AccessFlags2::SHADER_READ,
                dst_stage: vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                dst_access: vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
            })),
            _ => Err(UnrecognizedTransition { from, to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_edges_resolve() {
        assert!(matches!(TransitionMasks::lookup(TargetLayout::Undefined, TargetLayout::WriteOptimal), Ok(Some(_))));
        assert!(matches!(TransitionMasks::lookup(TargetLayout::WriteOptimal, TargetLayout::ReadOptimal), Ok(Some(_))));
        assert!(matches!(TransitionMasks::lookup(TargetLayout::ReadOptimal, TargetLayout::WriteOptimal), Ok(Some(_))));
    }

    #[test]
    fn test_same_state_is_noop() {
        for state in [TargetLayout::Undefined, TargetLayout::WriteOptimal, TargetLayout::ReadOptimal] {
            assert_eq!(TransitionMasks::lookup(state, state), Ok(None));
        }
    }

    #[test]
    fn test_undeclared_edges_error() {
        for (from, to) in [
            (TargetLayout::Undefined, TargetLayout::ReadOptimal),
            (TargetLayout::WriteOptimal, TargetLayout::Undefined),
            (TargetLayout::ReadOptimal, TargetLayout::Undefined),
        ] {
            assert_eq!(TransitionMasks::lookup(from, to), Err(UnrecognizedTransition { from, to }));
        }
    }

    #[test]
    fn test_write_to_read_sync_scope() {
        let masks = TransitionMasks::lookup(TargetLayout::WriteOptimal, TargetLayout::ReadOptimal).unwrap().unwrap();
        assert_eq!(masks.src_stage, vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags2::FRAGMENT_SHADER);
    }
}
