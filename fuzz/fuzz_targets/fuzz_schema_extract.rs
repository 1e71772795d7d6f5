//! Fuzz target for field-schema parsing and service rendering.
//!
//! Any input either fails with a schema error or yields a service whose
//! declared members and assembled features agree.

#![no_main]

use libfuzzer_sys::fuzz_target;
use space_publish::bundle::{assembled_features, declared_members, Bundle, BundleSpec, TemplateSet};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(templates) = TemplateSet::builtin() else {
        return;
    };
    if let Ok(bundle) = Bundle::generate(templates, &BundleSpec::new("fuzz", "model.pkl"), text) {
        let declared = declared_members(&bundle.service.contents);
        assert_eq!(declared, assembled_features(&bundle.service.contents));
        assert_eq!(declared.len(), bundle.fields.len());
    }
});
