//! Service response fixtures and mock-server setup

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Task id handed out by the mock upload endpoint
pub const TASK_ID: &str = "7f3c9a2e-0d4b-4f61-9a8e-2b5c1d7e8f90";

/// OCR markdown as the service returns it for a sales report
pub const OCR_MARKDOWN: &str = "\
# 华东区2024年第一季度销售报告

## 月度销售额

| 月份 | 计划 | 实际 |
|------|------|------|
| 1月 | 4,000 | 4,200 |
| 2月 | 5,500 | 5,800 |

## 同比增长率

| 月份 | 增长率 | 备注 |
|---|---|---|
| 1月 | 8.5% | 稳定 |

季度合计: 10000万元
";

/// Status body in the service's wire format
pub fn status_body(status: &str, progress: u8, step: &str, message: &str) -> Value {
    json!({
        "task_id": TASK_ID,
        "status": status,
        "current_step": step,
        "progress": progress,
        "message": message,
        "created_at": "2024-05-01T10:00:00.000001",
        "updated_at": format!("2024-05-01T10:00:{:02}.000001", progress / 2),
        "has_results": status == "completed",
    })
}

/// Results body in the service's wire format
pub fn results_body(markdown: &str) -> Value {
    json!({
        "ocr_result": {
            "markdown": markdown,
            "page_count": 3,
            "file_name": "q1_report.pdf",
            "file_info": {"size": 1024},
            "processing_time": 4.2,
            "status": "success"
        },
        "analysis_result": {
            "source": "ocr",
            "total_chunks": 2,
            "analyzed_chunks": [{"chunk_id": 0}, {"chunk_id": 1}],
            "metadata": {"model": "analysis"}
        },
        "visualization_result": {
            "html": "<html><body>报告</body></html>",
            "title": "华东区季度销售报告",
            "summary": "销售额稳步增长"
        },
        "files": {
            "json_file": format!("output/results_{TASK_ID}.json"),
            "html_file": format!("output/report_{TASK_ID}.html")
        }
    })
}

/// Mount `POST /upload` answering with [`TASK_ID`]
pub async fn mount_upload(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": TASK_ID,
            "status": "processing",
            "message": "文件上传成功，开始处理",
            "file_info": {"filename": "q1_report.pdf", "size_bytes": 8, "size_mb": 0.0}
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount status responses that are served once each, in order; the last one repeats
pub async fn mount_status_sequence(server: &MockServer, bodies: Vec<Value>) {
    let status_path = format!("/status/{TASK_ID}");
    let last = bodies.len().saturating_sub(1);
    for (i, body) in bodies.into_iter().enumerate() {
        let mock = Mock::given(method("GET"))
            .and(path(status_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body));
        let mock = if i < last { mock.up_to_n_times(1) } else { mock };
        mock.mount(server).await;
    }
}

/// Mount `GET /results/{id}`
pub async fn mount_results(server: &MockServer, markdown: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/results/{TASK_ID}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(markdown)))
        .mount(server)
        .await;
}

/// Mount `GET /download/{id}/{kind}` returning `body`
pub async fn mount_download(server: &MockServer, kind: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{TASK_ID}/{kind}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}
