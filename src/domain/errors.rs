/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakeLoanError {
    /// 返却期限が表現できる日時の範囲を超える
    DeadlineOutOfRange,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnLoanError {
    /// 既に返却済み
    AlreadyReturned,
}
