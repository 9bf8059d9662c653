pub mod mask;
pub mod plugin_option;
pub mod redirect_log;

pub use mask::Entity as MaskEntity;
pub use plugin_option::Entity as PluginOptionEntity;
pub use redirect_log::Entity as RedirectLogEntity;
