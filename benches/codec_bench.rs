//! Benchmarks for the wire codec and domain decomposition.
//!
//! Measures the per-response parsing cost on a typical referral packet.

use criterion::{BenchmarkId, Criterion, black_box};
use std::net::Ipv4Addr;

use delver::dns::{Question, Record, RecordData, Response, TYPE_A, TYPE_NS};
use delver::domain;

fn referral_packet() -> Vec<u8> {
    let authorities = (0u8..4)
        .map(|i| Record {
            name: "com".into(),
            rtype: TYPE_NS,
            ttl: 172800,
            data: RecordData::Name(format!("{}.gtld-servers.net", (b'a' + i) as char)),
        })
        .collect();
    let additionals = (0u8..4)
        .map(|i| Record {
            name: format!("{}.gtld-servers.net", (b'a' + i) as char),
            rtype: TYPE_A,
            ttl: 172800,
            data: RecordData::Addr(Ipv4Addr::new(192, 5, 6, 30 + i)),
        })
        .collect();

    Response {
        id: 1,
        rcode: 0,
        answers: vec![],
        authorities,
        additionals,
    }
    .to_bytes(&Question {
        name: "com".into(),
        qtype: TYPE_NS,
    })
}

fn bench_codec(c: &mut Criterion) {
    let packet = referral_packet();

    let mut group = c.benchmark_group("codec");

    group.bench_function(BenchmarkId::new("parse", "referral"), |b| {
        b.iter(|| Response::parse(black_box(&packet)).unwrap())
    });

    group.bench_function(BenchmarkId::new("substrings", "deep_name"), |b| {
        b.iter(|| domain::substrings(black_box("a.b.example.com")))
    });

    group.finish();
}

fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    bench_codec(&mut criterion);
    criterion.final_summary();
}
