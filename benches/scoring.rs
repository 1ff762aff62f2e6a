use criterion::{criterion_group, criterion_main, Criterion};

use msgtriage::analysis::score_header;
use msgtriage::analysis::urls::extract_urls;
use msgtriage::config::ScoringConfig;
use msgtriage::parser::HeaderBlock;

fn sample_header() -> String {
    let mut header = String::new();
    for hop in 0..8 {
        header.push_str(&format!(
            "Received: from relay{hop}.example.net (relay{hop}.example.net [198.51.100.{hop}])\r\n\
\tby mx.corp.example with ESMTP id q{hop}si00{hop}\r\n\
\tfor <bob@corp.example>; Tue, 1 Jul 2003 10:52:{hop:02} +0200\r\n"
        ));
    }
    header.push_str(
        "Received-SPF: Pass (mx.corp.example: domain of alice@partner.example \
designates 192.0.2.10 as permitted sender)\r\n\
Received: from edge (envelope-from=\"alice@partner.example\")\r\n\
Received: from gateway (x-sender=\"alice@partner.example\")\r\n\
From: Alice Example <alice@partner.example>\r\n\
To: bob@corp.example\r\n\
Cc: carol@corp.example\r\n\
Subject: Quarterly figures\r\n\
Date: Tue, 1 Jul 2003 10:52:37 +0200\r\n\
Message-ID: <20030701105237.GA1234@partner.example>\r\n",
    );
    header
}

fn sample_body() -> String {
    let mut body = String::new();
    for i in 0..40 {
        body.push_str(&format!(
            "Item {i} is tracked at <https://tracker.example.com/item/{i}> and the \
build lives at https://ci.example.net/job/{i}/artifact \r\n\r\n"
        ));
    }
    body
}

fn bench_score_header(c: &mut Criterion) {
    let header = sample_header();
    let config = ScoringConfig::default();

    c.bench_function("score_header", |b| {
        b.iter(|| score_header(&header, Some("alice@partner.example"), &config))
    });
}

fn bench_parse_header_block(c: &mut Criterion) {
    let header = sample_header();

    c.bench_function("parse_header_block", |b| b.iter(|| HeaderBlock::parse(&header)));
}

fn bench_extract_urls(c: &mut Criterion) {
    let body = sample_body();

    c.bench_function("extract_urls", |b| b.iter(|| extract_urls(&body)));
}

criterion_group!(
    benches,
    bench_score_header,
    bench_parse_header_block,
    bench_extract_urls
);
criterion_main!(benches);
