// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册抓取器相关指标
pub fn init_metrics(addr: SocketAddr) {
    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_counter!(
        "scraper_items_ingested_total",
        "Total number of items persisted and published by scrapers"
    );
    describe_counter!(
        "scraper_items_skipped_total",
        "Total number of fetched items that were not ingested, by reason"
    );
    describe_counter!(
        "scraper_fetch_errors_total",
        "Total number of failed calls to an external source"
    );
    describe_histogram!(
        "scraper_iteration_duration_seconds",
        "Duration of one retrieval loop iteration in seconds"
    );
    describe_counter!(
        "orchestrator_messages_relayed_total",
        "Total number of worker messages relayed to the caller"
    );
    describe_counter!(
        "bus_messages_published_total",
        "Total number of messages published on the message bus"
    );

    info!("Metrics exporter listening on {}", addr);
}
