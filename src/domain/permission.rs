use serde::{Deserialize, Serialize};

/// 利用者に付与される権限
///
/// ユーザーサービスのビットマスク表現に合わせ、各権限は1ビットに対応する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// 書籍の追加・編集・削除
    ManageBooks,
    /// 総在庫数の参照
    QueryTotalStock,
    /// 総在庫数の変更（QueryTotalStockが前提）
    ChangeTotalStock,
    /// 他の利用者情報の参照
    QueryUsers,
    /// 他の利用者の追加・編集・削除（QueryUsersが前提）
    ManageUsers,
    /// 自分の持つ権限の一部を他者に付与
    GrantPermissions,
    /// 貸出・返却の登録
    LoanBooks,
    /// 貸出可能冊数の参照
    QueryAvailableStock,
    /// 貸出状況（予約・延滞）の参照
    QueryReservations,
}

impl Permission {
    pub const ALL: [Permission; 9] = [
        Permission::ManageBooks,
        Permission::QueryTotalStock,
        Permission::ChangeTotalStock,
        Permission::QueryUsers,
        Permission::ManageUsers,
        Permission::GrantPermissions,
        Permission::LoanBooks,
        Permission::QueryAvailableStock,
        Permission::QueryReservations,
    ];

    /// ビットマスク上の値
    pub fn bit(self) -> u64 {
        let shift = match self {
            Permission::ManageBooks => 0,
            Permission::QueryTotalStock => 1,
            Permission::ChangeTotalStock => 2,
            Permission::QueryUsers => 3,
            Permission::ManageUsers => 4,
            Permission::GrantPermissions => 5,
            Permission::LoanBooks => 6,
            Permission::QueryAvailableStock => 7,
            Permission::QueryReservations => 8,
        };
        1 << shift
    }
}

/// 権限の集合
///
/// 未知のビットはそのまま保持する（ユーザーサービス側の拡張に備える）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u64);

impl Permissions {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self(u64::MAX)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn with(self, permission: Permission) -> Self {
        Self(self.0 | permission.bit())
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }
}

impl FromIterator<Permission> for Permissions {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}
