#![no_main]

use libfuzzer_sys::fuzz_target;
use qrda_qpp::converter::{ConversionOptions, Converter};
use qrda_qpp::source::Source;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must either convert or fail with an error, never panic
    for allow_unknown_templates in [false, true] {
        let options = ConversionOptions {
            allow_unknown_templates,
            ..Default::default()
        };
        let converted = Converter::new(Source::from_bytes("fuzz.xml", data))
            .with_options(options)
            .convert();

        // Rendering either document must not panic
        if let Ok(report) = converted {
            let _ = report.qpp().to_json_string();
            let _ = report.errors_json();
        }
    }
});
