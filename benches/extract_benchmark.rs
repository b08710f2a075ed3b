//! Benchmarks for ecucsheet extraction and workbook writing.
//!
//! Run with: cargo bench
//!
//! These benchmarks test performance at various configuration sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ecucsheet::render::{to_workbook, RenderOptions};

/// Creates a synthetic ECU configuration with the given number of
/// containers, each holding two sub-containers.
fn create_test_config(container_count: usize) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR>
  <AR-PACKAGES><AR-PACKAGE><SHORT-NAME>Bench</SHORT-NAME><ELEMENTS>
    <ECUC-MODULE-CONFIGURATION-VALUES>
      <SHORT-NAME>Com</SHORT-NAME>
      <CONTAINERS>"#,
    );

    for i in 0..container_count {
        content.push_str(&format!(
            r#"
        <ECUC-CONTAINER-VALUE>
          <SHORT-NAME>ComIPdu_{i}</SHORT-NAME>
          <DEFINITION-REF DEST="ECUC-PARAM-CONF-CONTAINER-DEF">/AUTOSAR/EcucDefs/Com/ComConfig/ComIPdu</DEFINITION-REF>
          <SUB-CONTAINERS>
            <ECUC-CONTAINER-VALUE>
              <SHORT-NAME>ComSignal_{i}_a</SHORT-NAME>
              <DEFINITION-REF DEST="ECUC-PARAM-CONF-CONTAINER-DEF">/AUTOSAR/EcucDefs/Com/ComConfig/ComSignal</DEFINITION-REF>
            </ECUC-CONTAINER-VALUE>
            <ECUC-CONTAINER-VALUE>
              <SHORT-NAME>ComSignal_{i}_b</SHORT-NAME>
              <DEFINITION-REF DEST="ECUC-PARAM-CONF-CONTAINER-DEF">/AUTOSAR/EcucDefs/Com/ComConfig/ComSignal</DEFINITION-REF>
            </ECUC-CONTAINER-VALUE>
          </SUB-CONTAINERS>
        </ECUC-CONTAINER-VALUE>"#
        ));
    }

    content.push_str(
        r#"
      </CONTAINERS>
    </ECUC-MODULE-CONFIGURATION-VALUES>
  </ELEMENTS></AR-PACKAGE></AR-PACKAGES>
</AUTOSAR>"#,
    );
    content
}

/// Benchmark extraction at various sizes.
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");

    for count in [10, 100, 1000, 5000].iter() {
        let xml = create_test_config(*count);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::new("containers", count), &xml, |b, xml| {
            b.iter(|| {
                let _ = ecucsheet::extract_str(black_box(xml));
            });
        });
    }

    group.finish();
}

/// Benchmark workbook serialization.
fn bench_workbook_writing(c: &mut Criterion) {
    let mut group = c.benchmark_group("workbook_writing");

    for count in [10, 100, 1000].iter() {
        let result = ecucsheet::extract_str(&create_test_config(*count)).unwrap();

        group.bench_with_input(BenchmarkId::new("containers", count), &result, |b, result| {
            b.iter(|| {
                let workbook = to_workbook(black_box(result), &RenderOptions::default()).unwrap();
                let _ = workbook.to_bytes();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extraction, bench_workbook_writing);
criterion_main!(benches);
