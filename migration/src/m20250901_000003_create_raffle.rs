use sea_orm_migration::prelude::*;

use crate::m20250901_000001_create_users_and_profiles::Users;

/// 抽奖奖品，按轮次名称归属
#[derive(DeriveIden)]
enum RafflePrizes {
    Table,
    Id,
    Title,
    Description,
    RoundName,
    Value,
    WinnerUserId,
    CreatedAt,
    UpdatedAt,
}

/// 抽奖券分配：用户在某奖品上投入的券数
#[derive(DeriveIden)]
enum RaffleTickets {
    Table,
    Id,
    UserId,
    PrizeId,
    Count,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RafflePrizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RafflePrizes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RafflePrizes::Title)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RafflePrizes::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RafflePrizes::RoundName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RafflePrizes::Value)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(RafflePrizes::WinnerUserId).integer().null())
                    .col(
                        ColumnDef::new(RafflePrizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RafflePrizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_raffle_prizes_round_name")
                    .table(RafflePrizes::Table)
                    .col(RafflePrizes::RoundName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RaffleTickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RaffleTickets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RaffleTickets::UserId).integer().not_null())
                    .col(ColumnDef::new(RaffleTickets::PrizeId).integer().not_null())
                    .col(
                        ColumnDef::new(RaffleTickets::Count)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RaffleTickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RaffleTickets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_raffle_tickets_user")
                            .from(RaffleTickets::Table, RaffleTickets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_raffle_tickets_prize")
                            .from(RaffleTickets::Table, RaffleTickets::PrizeId)
                            .to(RafflePrizes::Table, RafflePrizes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个用户在每个奖品上只有一条分配记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_raffle_tickets_user_prize_unique")
                    .table(RaffleTickets::Table)
                    .col(RaffleTickets::UserId)
                    .col(RaffleTickets::PrizeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：分配 -> 奖品
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(RaffleTickets::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(RafflePrizes::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
