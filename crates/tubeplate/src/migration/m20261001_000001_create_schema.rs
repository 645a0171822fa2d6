//! Initial migration to create the tubeplate database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_channels(manager).await?;
        self.create_templates(manager).await?;
        self.create_containers(manager).await?;
        self.create_videos(manager).await?;
        self.create_video_variables(manager).await?;
        self.create_description_history(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DescriptionHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VideoVariables::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Videos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Containers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Templates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Channels::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_channels(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Channels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Channels::Id).uuid().not_null().primary_key())
                    // Ownership
                    .col(ColumnDef::new(Channels::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Channels::RemoteChannelId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    // Cached metadata
                    .col(ColumnDef::new(Channels::Title).string().not_null())
                    .col(ColumnDef::new(Channels::ThumbnailUrl).text().null())
                    .col(
                        ColumnDef::new(Channels::SubscriberCount)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Channels::UploadsPlaylistId).string().null())
                    // Credentials
                    .col(ColumnDef::new(Channels::AccessToken).text().not_null())
                    .col(ColumnDef::new(Channels::RefreshToken).text().null())
                    .col(
                        ColumnDef::new(Channels::TokenExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Channels::TokenStatus)
                            .string()
                            .not_null()
                            .default("valid"),
                    )
                    // Sync lease
                    .col(
                        ColumnDef::new(Channels::SyncStatus)
                            .string()
                            .not_null()
                            .default("idle"),
                    )
                    .col(ColumnDef::new(Channels::SyncLeaseOwner).uuid().null())
                    .col(
                        ColumnDef::new(Channels::SyncLeaseExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Channels::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // Tracking
                    .col(
                        ColumnDef::new(Channels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Channels::UpdatedAt)
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
                    .name("idx_channels_user")
                    .table(Channels::Table)
                    .col(Channels::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_templates(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Templates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Templates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Templates::UserId).uuid().not_null())
                    .col(ColumnDef::new(Templates::Name).string().not_null())
                    .col(ColumnDef::new(Templates::Content).text().not_null())
                    .col(
                        ColumnDef::new(Templates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Templates::UpdatedAt)
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
                    .name("idx_templates_user")
                    .table(Templates::Table)
                    .col(Templates::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_containers(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Containers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Containers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Containers::UserId).uuid().not_null())
                    .col(ColumnDef::new(Containers::Name).string().not_null())
                    .col(
                        ColumnDef::new(Containers::TemplateOrder)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(Containers::Separator)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Containers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Containers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_videos(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Videos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Videos::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Videos::ChannelId).uuid().not_null())
                    .col(ColumnDef::new(Videos::ContainerId).uuid().null())
                    .col(ColumnDef::new(Videos::RemoteVideoId).string().not_null())
                    .col(ColumnDef::new(Videos::Title).string().not_null())
                    .col(ColumnDef::new(Videos::CurrentDescription).text().null())
                    .col(
                        ColumnDef::new(Videos::PublishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Videos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Videos::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_videos_channel")
                            .from(Videos::Table, Videos::ChannelId)
                            .to(Channels::Table, Channels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_videos_container")
                            .from(Videos::Table, Videos::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // A remote id is unique within its channel
        manager
            .create_index(
                Index::create()
                    .name("idx_videos_channel_remote")
                    .table(Videos::Table)
                    .col(Videos::ChannelId)
                    .col(Videos::RemoteVideoId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_videos_container")
                    .table(Videos::Table)
                    .col(Videos::ContainerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_video_variables(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VideoVariables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoVariables::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VideoVariables::VideoId).uuid().not_null())
                    .col(ColumnDef::new(VideoVariables::TemplateId).uuid().not_null())
                    .col(ColumnDef::new(VideoVariables::Name).string().not_null())
                    .col(ColumnDef::new(VideoVariables::Value).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_variables_video")
                            .from(VideoVariables::Table, VideoVariables::VideoId)
                            .to(Videos::Table, Videos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_variables_template")
                            .from(VideoVariables::Table, VideoVariables::TemplateId)
                            .to(Templates::Table, Templates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_video_variables_unique")
                    .table(VideoVariables::Table)
                    .col(VideoVariables::VideoId)
                    .col(VideoVariables::TemplateId)
                    .col(VideoVariables::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_description_history(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DescriptionHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DescriptionHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DescriptionHistory::VideoId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DescriptionHistory::Version)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DescriptionHistory::Description)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DescriptionHistory::Actor).string().not_null())
                    .col(
                        ColumnDef::new(DescriptionHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_description_history_video")
                            .from(DescriptionHistory::Table, DescriptionHistory::VideoId)
                            .to(Videos::Table, Videos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_description_history_version")
                    .table(DescriptionHistory::Table)
                    .col(DescriptionHistory::VideoId)
                    .col(DescriptionHistory::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "channels")]
enum Channels {
    Table,
    Id,
    UserId,
    RemoteChannelId,
    Title,
    ThumbnailUrl,
    SubscriberCount,
    UploadsPlaylistId,
    AccessToken,
    RefreshToken,
    TokenExpiresAt,
    TokenStatus,
    SyncStatus,
    SyncLeaseOwner,
    SyncLeaseExpiresAt,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "templates")]
enum Templates {
    Table,
    Id,
    UserId,
    Name,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "containers")]
enum Containers {
    Table,
    Id,
    UserId,
    Name,
    TemplateOrder,
    Separator,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "videos")]
enum Videos {
    Table,
    Id,
    ChannelId,
    ContainerId,
    RemoteVideoId,
    Title,
    CurrentDescription,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "video_variables")]
enum VideoVariables {
    Table,
    Id,
    VideoId,
    TemplateId,
    Name,
    Value,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "description_history")]
enum DescriptionHistory {
    Table,
    Id,
    VideoId,
    Version,
    Description,
    Actor,
    CreatedAt,
}
