//! 云厂商 CLI 输出解析
//!
//! 解析 `ibmcloud pi instance <name>` 的表格式输出：
//! ```text
//! ID                  5f2d1c80-0a8e-4b76-a1d3-6f3c7b2d9e11
//! Name                ocp-prod-worker-3
//! Status              ACTIVE
//! Networks            IP: 192.168.10.21, External Address: 169.48.2.15, Network: pub-net
//! ```

use regex::Regex;
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::models::InstanceStatus;

/// 解析实例状态（`Status` 行的第二列）
pub fn parse_instance_status(output: &str) -> Result<InstanceStatus> {
    let re = Regex::new(r"(?m)^\s*Status\s+(\S+)")
        .map_err(|e| ProviderError::ParseError(e.to_string()))?;

    let caps = re
        .captures(output)
        .ok_or_else(|| ProviderError::ParseError("输出中未找到 Status 字段".to_string()))?;

    let status = InstanceStatus::parse(&caps[1]);
    debug!("解析实例状态: {}", status);
    Ok(status)
}

/// 解析实例外部地址
///
/// 取 `External Address` 之后的第一个字段，并去掉尾部的分隔符（逗号、分号、括号）。
pub fn parse_external_address(output: &str) -> Result<String> {
    let re = Regex::new(r"External Address:?\s+(\S+)")
        .map_err(|e| ProviderError::ParseError(e.to_string()))?;

    let caps = re.captures(output).ok_or_else(|| {
        ProviderError::ParseError("输出中未找到 External Address 字段".to_string())
    })?;

    let address = caps[1].trim_end_matches([',', ';', ')', ']']).to_string();
    if address.is_empty() {
        return Err(ProviderError::ParseError("外部地址为空".to_string()));
    }

    debug!("解析外部地址: {}", address);
    Ok(address)
}
