//! The public-read bucket policy document.

use serde_json::{Value, json};

use crate::core::errors::Result;

/// Object and bucket actions granted to the owner principal.
pub const OWNER_ACTIONS: [&str; 8] = [
    "s3:ListMultipartUploadParts",
    "s3:PutObject",
    "s3:AbortMultipartUpload",
    "s3:DeleteObject",
    "s3:GetBucketLocation",
    "s3:GetObject",
    "s3:ListBucket",
    "s3:ListBucketMultipartUploads",
];

/// Anonymous `GetObject` on every key, plus full management for `owner`.
#[must_use]
pub fn public_read_policy(bucket: &str, owner: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "PublicRead",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*"),
            },
            {
                "Sid": "UserWriteDelete",
                "Effect": "Allow",
                "Principal": { "AWS": owner },
                "Action": OWNER_ACTIONS,
                "Resource": [
                    format!("arn:aws:s3:::{bucket}"),
                    format!("arn:aws:s3:::{bucket}/*"),
                ],
            },
        ],
    })
}

/// Pretty-printed document body, ready to `PUT /<bucket>?policy`.
pub fn public_read_policy_body(bucket: &str, owner: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&public_read_policy(bucket, owner))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_statements_scoped_to_bucket_and_owner() {
        let doc = public_read_policy("photos", "alice");
        let statements = doc["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 2);

        assert_eq!(statements[0]["Sid"], "PublicRead");
        assert_eq!(statements[0]["Principal"], "*");
        assert_eq!(statements[0]["Action"], "s3:GetObject");
        assert_eq!(statements[0]["Resource"], "arn:aws:s3:::photos/*");

        assert_eq!(statements[1]["Sid"], "UserWriteDelete");
        assert_eq!(statements[1]["Principal"]["AWS"], "alice");
        assert_eq!(statements[1]["Action"].as_array().unwrap().len(), 8);
        assert_eq!(
            statements[1]["Resource"],
            json!(["arn:aws:s3:::photos", "arn:aws:s3:::photos/*"])
        );
    }

    #[test]
    fn body_is_valid_json() {
        let body = public_read_policy_body("b", "o").unwrap();
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["Version"], "2012-10-17");
    }
}
