use std::ffi::CStr;

use ash::vk;
use itertools::Itertools;

/// 校验层名称
const VALIDATION_LAYER_NAME: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan Instance 封装
///
/// 创建时按照 display handle 查询窗口系统需要的 instance extensions；
/// 校验层是可选的：不可用时仅记录 warning，程序继续运行。
pub struct GfxInstance {
    pub ash_instance: ash::Instance,
    /// 校验层是否真实启用
    pub validation_enabled: bool,
}
// new & init
impl GfxInstance {
    pub fn new(vk_entry: &ash::Entry, raw_display_handle: raw_window_handle::RawDisplayHandle, app_name: &str) -> Self {
        let app_name = std::ffi::CString::new(app_name).unwrap();
        let app_info = vk::ApplicationInfo::default()
            .application_name(app_name.as_c_str())
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(c"Luxel")
            .api_version(vk::API_VERSION_1_3);

        let mut exts = ash_window::enumerate_required_extensions(raw_display_handle).unwrap().to_vec();

        let validation_enabled = Self::validation_layer_available(vk_entry);
        let mut layers = Vec::new();
        if validation_enabled {
            layers.push(VALIDATION_LAYER_NAME.as_ptr());
            exts.push(ash::ext::debug_utils::NAME.as_ptr());
        } else {
            // 校验层缺失属于非致命降级
            log::warn!("validation layer {:?} not available, continuing without it", VALIDATION_LAYER_NAME);
        }

        let mut exts_str = String::new();
        for ext in &exts {
            exts_str.push_str(&format!("\n\t{:?}", unsafe { CStr::from_ptr(*ext) }));
        }
        log::info!("instance exts: {}", exts_str);

        let instance_ci = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&exts)
            .enabled_layer_names(&layers);

        let ash_instance = unsafe { vk_entry.create_instance(&instance_ci, None).unwrap() };

        Self {
            ash_instance,
            validation_enabled,
        }
    }

    fn validation_layer_available(vk_entry: &ash::Entry) -> bool {
        let layers = unsafe { vk_entry.enumerate_instance_layer_properties().unwrap_or_default() };
        layers
            .iter()
            .filter_map(|layer| layer.layer_name_as_c_str().ok())
            .collect_vec()
            .contains(&VALIDATION_LAYER_NAME)
    }
}
// destroy
impl GfxInstance {
    pub fn destroy(self) {
        unsafe {
            self.ash_instance.destroy_instance(None);
        }
    }
}
