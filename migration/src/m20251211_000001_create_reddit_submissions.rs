use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RedditSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RedditSubmissions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RedditSubmissions::Name).string().not_null())
                    .col(ColumnDef::new(RedditSubmissions::Title).text().not_null())
                    .col(ColumnDef::new(RedditSubmissions::Author).string().null())
                    .col(ColumnDef::new(RedditSubmissions::Subreddit).string().not_null())
                    .col(ColumnDef::new(RedditSubmissions::Selftext).text().not_null())
                    .col(ColumnDef::new(RedditSubmissions::Url).text().not_null())
                    .col(ColumnDef::new(RedditSubmissions::Permalink).text().not_null())
                    .col(ColumnDef::new(RedditSubmissions::Score).big_integer().not_null())
                    .col(
                        ColumnDef::new(RedditSubmissions::NumComments)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RedditSubmissions::CreatedUtc).double().not_null())
                    .col(ColumnDef::new(RedditSubmissions::Edited).double().null())
                    .col(
                        ColumnDef::new(RedditSubmissions::Over18)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reddit_submissions_subreddit")
                    .table(RedditSubmissions::Table)
                    .col(RedditSubmissions::Subreddit)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RedditSubmissions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RedditSubmissions {
    Table,
    Id,
    Name,
    Title,
    Author,
    Subreddit,
    Selftext,
    Url,
    Permalink,
    Score,
    NumComments,
    CreatedUtc,
    Edited,
    #[sea_orm(iden = "over_18")]
    Over18,
}
