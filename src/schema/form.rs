use std::str::FromStr;

use actix_multipart::form::{bytes::Bytes, text::Text, MultipartCollect, MultipartForm};
use actix_web::{dev::Payload, web::Json, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// Bodies that the edit forms may also post as `multipart/form-data`.
pub trait FromMultipart: Sized {
    type Form: MultipartCollect;

    fn from_form(form: Self::Form) -> Result<Self, AppError>;
}

/// A JSON body, or the same fields sent as multipart text parts.
pub struct JsonOrForm<T>(pub T);

impl<T> JsonOrForm<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> FromRequest for JsonOrForm<T>
where
    T: DeserializeOwned + FromMultipart + 'static,
    T::Form: 'static,
{
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req:&HttpRequest, payload:&mut Payload) -> Self::Future{
        if req.content_type().starts_with("multipart/form-data") {
            let form = MultipartForm::<T::Form>::from_request(req, payload);
            return Box::pin(async move {
                let form = form.await?.into_inner();
                Ok(JsonOrForm(T::from_form(form)?))
            });
        }

        let json = Json::<T>::from_request(req, payload);
        Box::pin(async move { Ok(JsonOrForm(json.await?.into_inner())) })
    }
}

/// Blank parts count as absent, the way browsers send untouched inputs.
pub fn text_field(field:Option<Text<String>>) -> Option<String>{
    field
        .map(|text| text.0.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_field<T:FromStr>(field:Option<Text<String>>, name:&str) -> Result<Option<T>, AppError>{
    text_field(field)
        .map(|value| value.parse::<T>().map_err(|_| AppError::BadRequest(format!("Invalid value for {name}"))))
        .transpose()
}

/// Media is stored by URL, so a part carrying a file is refused.
pub fn url_field(field:Option<Bytes>, name:&str) -> Result<Option<String>, AppError>{
    let Some(part) = field else {
        return Ok(None);
    };

    if part.file_name.is_some() {
        return Err(AppError::BadRequest(format!(
            "File uploads are not supported; send {name} as a URL"
        )));
    }

    let value = String::from_utf8(part.data.to_vec())
        .map_err(|_| AppError::BadRequest(format!("Invalid value for {name}")))?;
    let value = value.trim();

    Ok((!value.is_empty()).then(|| value.to_string()))
}

#[cfg(test)]
mod tests{
    use super::*;

    fn bytes_part(data:&'static str, file_name:Option<&str>) -> Bytes{
        Bytes{
            data: data.as_bytes().to_vec().into(),
            content_type: None,
            file_name: file_name.map(str::to_string),
        }
    }

    #[test]
    fn test_blank_text_is_absent(){
        assert_eq!(text_field(Some(Text("  ".to_string()))), None);
        assert_eq!(text_field(Some(Text(" Rust ".to_string()))), Some("Rust".to_string()));
        assert_eq!(text_field(None), None);
    }

    #[test]
    fn test_parse_field(){
        assert_eq!(parse_field::<i32>(Some(Text("499".to_string())), "coursePrice").unwrap(), Some(499));
        assert_eq!(parse_field::<bool>(Some(Text("".to_string())), "isFree").unwrap(), None);

        let err = parse_field::<i32>(Some(Text("cheap".to_string())), "coursePrice").unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for coursePrice");
    }

    #[test]
    fn test_url_field_refuses_files(){
        assert_eq!(
            url_field(Some(bytes_part("https://cdn.test/a.png", None)), "courseThumbnail").unwrap(),
            Some("https://cdn.test/a.png".to_string())
        );

        let err = url_field(Some(bytes_part("\u{89}PNG", Some("a.png"))), "courseThumbnail").unwrap_err();
        assert_eq!(err.to_string(), "File uploads are not supported; send courseThumbnail as a URL");
    }
}
