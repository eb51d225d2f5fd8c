use actix_web::{HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct R<T> {
    pub code: u16,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> R<T> {
    /// 成功响应，返回 Result 类型以便直接在 handler 中使用
    pub fn success(data: T) -> Result<R<T>, crate::error::AppError> {
        Ok(Self {
            code: 200,
            msg: "success".to_string(),
            data: Some(data),
        })
    }

    pub fn error(code: u16, msg: String) -> Self {
        Self {
            code,
            msg,
            data: None,
        }
    }
}

impl R<()> {
    /// 成功响应（无数据），返回 Result 类型以便直接在 handler 中使用
    pub fn ok() -> Result<R<()>, crate::error::AppError> {
        Ok(R::<()> {
            code: 200,
            msg: "success".to_string(),
            data: None,
        })
    }
}

// 为 R<T> 实现 Responder trait
impl<T: Serialize> Responder for R<T> {
    type Body = actix_web::body::BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        match serde_json::to_string(&self) {
            Ok(body) => HttpResponse::Ok()
                .content_type("application/json")
                .body(body),
            Err(e) => HttpResponse::InternalServerError()
                .content_type("application/json")
                .body(format!(r#"{{"code":500,"msg":"Serialization error: {}"}}"#, e)),
        }
    }
}

/// 分页响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVo<T> {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub records: Vec<T>,
}

impl<T> PageVo<T> {
    pub fn new(total: u64, page: u64, page_size: u64, records: Vec<T>) -> Self {
        Self {
            total,
            page,
            page_size,
            records,
        }
    }

    /// 逐条转换记录类型, 分页信息保持不变
    pub fn map<V, F: FnMut(T) -> V>(self, f: F) -> PageVo<V> {
        PageVo {
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            records: self.records.into_iter().map(f).collect(),
        }
    }
}

/// 分页请求参数, 页码从 1 开始
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReq {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

impl PageReq {
    /// LIMIT/OFFSET 参数, 页大小限制在 [1, 200]
    pub fn limit_offset(&self) -> (u64, u64) {
        let size = self.page_size.clamp(1, 200);
        let page = self.page.max(1);
        (size, (page - 1) * size)
    }
}

impl Default for PageReq {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_offset() {
        let req = PageReq { page: 3, page_size: 20 };
        assert_eq!(req.limit_offset(), (20, 40));

        // 页码 0 按第一页处理, 页大小超限被截断
        let req = PageReq { page: 0, page_size: 100000 };
        assert_eq!(req.limit_offset(), (200, 0));
    }

    #[test]
    fn test_page_vo_map() {
        let vo = PageVo::new(2, 1, 20, vec![1i64, 2i64]);
        let mapped = vo.map(|v| v.to_string());
        assert_eq!(mapped.total, 2);
        assert_eq!(mapped.records, vec!["1".to_string(), "2".to_string()]);
    }
}
