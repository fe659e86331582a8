use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qrda_qpp::converter::Converter;
use qrda_qpp::encode::JsonWrapper;
use qrda_qpp::source::Source;

const FIXTURE: &str = include_str!("../tests/fixtures/valid-qrda-iii.xml");

/// Generate a QRDA III document with `num_measures` ACI measures
fn generate_document(num_measures: usize) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?>
<ClinicalDocument xmlns="urn:hl7-org:v3">
  <templateId root="2.16.840.1.113883.10.20.27.1.2" extension="2017-07-01"/>
  <informationRecipient>
    <intendedRecipient>
      <id root="2.16.840.1.113883.3.249.7" extension="MIPS_GROUP"/>
    </intendedRecipient>
  </informationRecipient>
  <documentationOf>
    <serviceEvent>
      <effectiveTime><low value="20170101"/><high value="20171231"/></effectiveTime>
      <performer>
        <assignedEntity>
          <representedOrganization>
            <id root="2.16.840.1.113883.4.2" extension="123456789"/>
          </representedOrganization>
        </assignedEntity>
      </performer>
    </serviceEvent>
  </documentationOf>
  <component><structuredBody><component><section>
    <templateId root="2.16.840.1.113883.10.20.27.2.5" extension="2017-06-01"/>
    <entry>
      <act>
        <templateId root="2.16.840.1.113883.10.20.17.3.8"/>
        <effectiveTime><low value="20170101"/><high value="20171231"/></effectiveTime>
      </act>
    </entry>"#,
    );

    for i in 0..num_measures {
        content.push_str(&format!(
            r#"
    <entry>
      <organizer>
        <templateId root="2.16.840.1.113883.10.20.27.3.28" extension="2017-06-01"/>
        <reference><externalDocument><id extension="ACI_BENCH_{}"/></externalDocument></reference>
        <component><observation>
          <templateId root="2.16.840.1.113883.10.20.27.3.31" extension="2016-09-01"/>
          <entryRelationship><observation>
            <templateId root="2.16.840.1.113883.10.20.27.3.3"/>
            <value value="{}"/>
          </observation></entryRelationship>
        </observation></component>
        <component><observation>
          <templateId root="2.16.840.1.113883.10.20.27.3.32" extension="2016-09-01"/>
          <entryRelationship><observation>
            <templateId root="2.16.840.1.113883.10.20.27.3.3"/>
            <value value="{}"/>
          </observation></entryRelationship>
        </observation></component>
      </organizer>
    </entry>"#,
            i,
            i * 3,
            i * 4 + 1
        ));
    }

    content.push_str("\n  </section></component></structuredBody></component>\n</ClinicalDocument>\n");
    content
}

/// Benchmark the bundled sample document
fn bench_fixture(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixture_conversion");
    group.throughput(Throughput::Bytes(FIXTURE.len() as u64));

    group.bench_function("valid-qrda-iii", |b| {
        b.iter(|| {
            let report = Converter::new(Source::from_bytes("bench.xml", FIXTURE))
                .convert()
                .expect("Conversion failed");
            report.qpp().to_json_string().expect("Rendering failed")
        });
    });

    group.finish();
}

/// Benchmark conversion as the number of measures grows
fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("qrda_conversion");

    for num_measures in [10, 100, 1000] {
        let document = generate_document(num_measures);
        group.throughput(Throughput::Elements(num_measures as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}measures", num_measures)),
            &document,
            |b, document| {
                b.iter_batched(
                    || Source::from_bytes("bench.xml", document.as_str()),
                    |source| {
                        Converter::new(source)
                            .convert()
                            .expect("Conversion failed")
                    },
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark validated integer puts
fn bench_validated_puts(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_wrapper");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("put_integer_1000", |b| {
        b.iter(|| {
            let mut wrapper = JsonWrapper::new();
            for i in 0..1000 {
                let _ = wrapper.push_integer(&format!("{},{:03}", i, i % 1000));
            }
            wrapper
        });
    });

    group.finish();
}

criterion_group!(benches, bench_fixture, bench_conversion, bench_validated_puts);
criterion_main!(benches);
