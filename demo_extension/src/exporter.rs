use grove::prelude::*;

/// Editor export hook that counts exported files and skips the ones listed
/// in `skipped`.
#[gclass(base = EditorExportPlugin)]
pub struct ModExporter {
    base: Base<ModExporter>,

    #[export(global_dir)]
    output_dir: String,

    #[export]
    skipped: Vec<String>,

    exported: i64,
}

#[gclass_impl]
impl ModExporter {
    #[vfunc]
    fn get_name(&self) -> String {
        "grove_mod_exporter".to_string()
    }

    #[vfunc]
    fn export_file(&mut self, path: String, kind: String, _features: PackedStringArray) -> GroveResult<()> {
        if self.skipped.iter().any(|s| path.ends_with(s.as_str())) {
            log::debug!("skipping {path} ({kind})");
            self.base.to_gd()?.skip()?;
            return Ok(());
        }
        self.exported += 1;
        Ok(())
    }

    #[func]
    fn exported_count(&self) -> i64 {
        self.exported
    }
}
