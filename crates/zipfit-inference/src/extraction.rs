//! AI criteria extraction from announcement text.
//!
//! Builds a deterministic instruction prompt around the raw document text,
//! requests low-temperature generation and parses the semi-structured JSON
//! reply defensively: every field is scanned independently, so one garbled
//! field never sinks the rest of the extraction. Only a reply with no
//! usable JSON at all is a hard failure.

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use zipfit_core::{defaults, Error, GenerationBackend, OfferCriteria, Result};

/// Criteria extractor driving a generation backend.
pub struct CriteriaExtractor {
    backend: Arc<dyn GenerationBackend>,
    temperature: f64,
    max_tokens: u32,
}

impl CriteriaExtractor {
    /// Create an extractor with the default sampling configuration.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            temperature: defaults::EXTRACTION_TEMPERATURE,
            max_tokens: defaults::EXTRACTION_MAX_TOKENS,
        }
    }

    /// Identifier of the model behind this extractor.
    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Extract structured criteria from raw announcement text.
    pub async fn extract(&self, raw_text: &str) -> Result<OfferCriteria> {
        let prompt = build_extraction_prompt(raw_text);

        debug!(
            subsystem = "inference",
            component = "extraction",
            op = "extract",
            prompt_len = prompt.len(),
            model = self.backend.model_name(),
            "Requesting criteria extraction"
        );

        let response = self
            .backend
            .generate(&prompt, self.temperature, self.max_tokens)
            .await?;

        parse_response(&response)
    }
}

/// Build the instruction prompt embedding the announcement text.
fn build_extraction_prompt(raw_text: &str) -> String {
    format!(
        r#"다음은 주택 청약 공고문의 내용입니다. 이 문서에서 자격 조건을 추출해주세요.

**추출할 정보:**
1. 청약명 (분양 단지명)
2. 위치/지역
3. 주소
4. 주택 유형 (아파트, 오피스텔, 빌라 등)
5. 나이 제한 (최소 나이, 최대 나이)
6. 소득 기준 (최소 소득, 최대 소득, KRW 단위)
7. 세대원 수 조건 (최소, 최대)
8. 무주택 조건 (보유 가능한 주택 수)
9. 특별 자격 조건
10. 우대 카테고리
11. 가격 범위 (최저가, 최고가)
12. 청약 기간

**출력 형식 (JSON):**
```json
{{
  "name": "청약명",
  "region": "지역 (서울, 경기 등)",
  "address": "상세 주소",
  "housing_category": "아파트 또는 오피스텔 또는 빌라 또는 타운하우스 또는 기타",
  "min_age": 나이최소값,
  "max_age": 나이최대값,
  "min_income": 소득최소값,
  "max_income": 소득최대값,
  "min_household_members": 세대원수최소값,
  "max_household_members": 세대원수최대값,
  "max_housing_owned": 보유가능주택수,
  "special_qualifications": "특별 자격 조건",
  "preference_categories": "우대 카테고리",
  "min_price": 최저가,
  "max_price": 최고가,
  "application_period": "청약 기간"
}}
```

**주의사항:**
- 명확하지 않은 항목은 null로 표시
- 숫자는 반드시 숫자 타입으로
- 소득과 가격은 원(KRW) 단위로 변환
- JSON 형식을 정확히 준수

**문서 내용:**
{}

위 내용을 분석하여 JSON 형식으로만 답변해주세요. 다른 설명은 포함하지 마세요."#,
        raw_text
    )
}

/// Parse a model reply into criteria, tolerating partial/malformed JSON.
fn parse_response(response: &str) -> Result<OfferCriteria> {
    let json = strip_code_fences(response);

    if !json.contains('{') {
        warn!(
            subsystem = "inference",
            component = "extraction",
            response_len = response.len(),
            "Model reply carries no JSON object"
        );
        return Err(Error::Extraction(
            "Model reply carries no JSON object".to_string(),
        ));
    }

    let criteria = OfferCriteria {
        name: extract_string(&json, "name"),
        region: extract_string(&json, "region"),
        address: extract_string(&json, "address"),
        housing_category: extract_string(&json, "housing_category"),
        min_age: extract_number(&json, "min_age").map(|n| n as i32),
        max_age: extract_number(&json, "max_age").map(|n| n as i32),
        min_income: extract_number(&json, "min_income"),
        max_income: extract_number(&json, "max_income"),
        min_household_members: extract_number(&json, "min_household_members").map(|n| n as i32),
        max_household_members: extract_number(&json, "max_household_members").map(|n| n as i32),
        max_housing_owned: extract_number(&json, "max_housing_owned").map(|n| n as i32),
        special_qualifications: extract_string(&json, "special_qualifications"),
        preference_categories: extract_string(&json, "preference_categories"),
        min_price: extract_number(&json, "min_price"),
        max_price: extract_number(&json, "max_price"),
        application_period: extract_string(&json, "application_period"),
    };

    if criteria == OfferCriteria::default() {
        return Err(Error::Extraction(
            "No fields could be extracted from the model reply".to_string(),
        ));
    }

    Ok(criteria)
}

/// Strip markdown code-fence wrappers (```json ... ``` or ``` ... ```).
fn strip_code_fences(response: &str) -> String {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

/// Scan for a quoted string field: `"key": "value"`.
fn extract_string(json: &str, key: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"([^"]+)""#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(json).map(|c| c[1].to_string())
}

/// Scan for a bare integer field: `"key": 123`.
fn extract_number(json: &str, key: &str) -> Option<i64> {
    let pattern = format!(r#""{}"\s*:\s*(\d+)"#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(json).and_then(|c| c[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "name": "강남 헤리티지",
        "region": "서울",
        "address": "서울특별시 강남구 테헤란로 123",
        "housing_category": "아파트",
        "min_age": 19,
        "max_age": 65,
        "min_income": 30000000,
        "max_income": 100000000,
        "min_household_members": 1,
        "max_household_members": 5,
        "max_housing_owned": 0,
        "special_qualifications": "신혼부부 우선",
        "preference_categories": "다자녀",
        "min_price": 500000000,
        "max_price": 900000000,
        "application_period": "2026-09-01"
    }"#;

    #[test]
    fn test_parse_well_formed_json() {
        let criteria = parse_response(WELL_FORMED).unwrap();
        assert_eq!(criteria.name.as_deref(), Some("강남 헤리티지"));
        assert_eq!(criteria.region.as_deref(), Some("서울"));
        assert_eq!(criteria.min_age, Some(19));
        assert_eq!(criteria.max_age, Some(65));
        assert_eq!(criteria.min_income, Some(30_000_000));
        assert_eq!(criteria.max_income, Some(100_000_000));
        assert_eq!(criteria.max_housing_owned, Some(0));
        assert_eq!(criteria.min_price, Some(500_000_000));
        assert_eq!(criteria.application_period.as_deref(), Some("2026-09-01"));
    }

    #[test]
    fn test_parse_strips_json_fence() {
        let wrapped = format!("```json\n{}\n```", WELL_FORMED);
        let criteria = parse_response(&wrapped).unwrap();
        assert_eq!(criteria.name.as_deref(), Some("강남 헤리티지"));
    }

    #[test]
    fn test_parse_strips_bare_fence() {
        let wrapped = format!("```\n{}\n```", WELL_FORMED);
        let criteria = parse_response(&wrapped).unwrap();
        assert_eq!(criteria.region.as_deref(), Some("서울"));
    }

    #[test]
    fn test_parse_tolerates_missing_and_null_fields() {
        let partial = r#"{"name": "한강 뷰", "min_age": 30, "max_income": null}"#;
        let criteria = parse_response(partial).unwrap();
        assert_eq!(criteria.name.as_deref(), Some("한강 뷰"));
        assert_eq!(criteria.min_age, Some(30));
        assert_eq!(criteria.max_income, None);
        assert_eq!(criteria.region, None);
        assert_eq!(criteria.max_housing_owned, None);
    }

    #[test]
    fn test_parse_tolerates_truncated_json() {
        // Output-token budget cut the reply mid-object.
        let truncated = r#"{"name": "미사 강변", "region": "경기", "min_age": 19, "max_ag"#;
        let criteria = parse_response(truncated).unwrap();
        assert_eq!(criteria.name.as_deref(), Some("미사 강변"));
        assert_eq!(criteria.region.as_deref(), Some("경기"));
        assert_eq!(criteria.min_age, Some(19));
        assert_eq!(criteria.max_age, None);
    }

    #[test]
    fn test_parse_no_json_is_hard_failure() {
        let err = parse_response("죄송합니다. 문서를 분석할 수 없습니다.").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_parse_empty_object_is_hard_failure() {
        let err = parse_response("{}").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_prompt_embeds_document_text() {
        let prompt = build_extraction_prompt("공고문 원문 텍스트");
        assert!(prompt.contains("공고문 원문 텍스트"));
        assert!(prompt.contains("\"min_age\""));
        assert!(prompt.contains("JSON"));
    }

    #[tokio::test]
    async fn test_extractor_uses_backend() {
        use crate::mock::MockGenerationBackend;

        let backend = Arc::new(MockGenerationBackend::with_response(WELL_FORMED));
        let extractor = CriteriaExtractor::new(backend.clone());
        let criteria = extractor.extract("공고문").await.unwrap();
        assert_eq!(criteria.name.as_deref(), Some("강남 헤리티지"));
        assert_eq!(backend.call_count(), 1);
        assert_eq!(extractor.model_name(), "mock-gen");
    }

    #[tokio::test]
    async fn test_extractor_propagates_backend_failure() {
        use crate::mock::MockGenerationBackend;

        let backend = Arc::new(MockGenerationBackend::failing("model offline"));
        let extractor = CriteriaExtractor::new(backend);
        let err = extractor.extract("공고문").await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }
}
