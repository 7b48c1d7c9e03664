//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Expenses {
    Table,
    Id,
    UserId,
    Category,
    Amount,
    Date,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Goals {
    Table,
    Id,
    UserId,
    Title,
    TargetAmount,
    CurrentAmount,
    TargetDate,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Bills {
    Table,
    Id,
    UserId,
    Title,
    Amount,
    Frequency,
    DueDate,
    IsPaid,
    Category,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Assets {
    Table,
    Id,
    UserId,
    Name,
    AssetType,
    PurchaseValue,
    CurrentValue,
    DepreciationRate,
    PurchaseDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Liabilities {
    Table,
    Id,
    UserId,
    Name,
    LiabilityType,
    PrincipalAmount,
    OutstandingAmount,
    InterestRate,
    EmiAmount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Categories {
    Table,
    Id,
    UserId,
    Name,
    Icon,
    CreatedAt,
}

#[derive(Iden)]
pub enum Profiles {
    Table,
    UserId,
    AnnualSalary,
    DisplayName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Achievements {
    Table,
    Id,
    UserId,
    AchievementType,
    Points,
    EarnedAt,
}

#[derive(Iden)]
pub enum ChangeLog {
    Table,
    Seq,
    UserId,
    TableName,
    RowId,
    Op,
    CreatedAt,
}
